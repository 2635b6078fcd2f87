extern crate csv;
#[macro_use]
extern crate log;
extern crate linked_hash_map;
extern crate rand;
extern crate rand_distr;

pub mod constants;
pub mod stats;
pub mod model;
pub mod table;
pub mod io;
pub mod simulate;
