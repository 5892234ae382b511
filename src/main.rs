use std::io::prelude::*;
use std::io::{stdin, stdout};

use anyhow::Context;
use protoc_gen_describe::compile::compile;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let mut buffer: Vec<u8> = Vec::new();
    stdin()
        .read_to_end(&mut buffer)
        .context("failed to read the request from stdin")?;

    let bytes = compile(buffer).context("failed to decode the request")?;

    stdout()
        .write_all(&bytes)
        .context("failed to write the response to stdout")?;
    Ok(())
}
