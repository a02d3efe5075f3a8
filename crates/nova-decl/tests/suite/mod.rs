mod fixtures;
mod providers;
