mod augment;
mod samples;
