#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate serde_json;
extern crate env_logger;
extern crate vcov;

use vcov::Result;
use vcov::codec::read_data;

use std::env;
use std::fs::File;
use std::io::{stdout, BufReader};
use std::path::PathBuf;

quick_main!(run);

fn run() -> Result<()> {
    env_logger::init();

    let filename = PathBuf::from(env::args_os().nth(1).expect("filename"));
    let file = File::open(&filename)?;
    let mut points = Vec::new();
    read_data(BufReader::new(file), &filename, |record, hits| {
        points.push(json!({
            "identity": record.identity,
            "attributes": record.attributes,
            "hits": hits,
        }));
    })?;
    serde_json::to_writer_pretty(stdout(), &points)?;
    Ok(())
}
