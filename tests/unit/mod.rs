mod dataset;
mod io;
