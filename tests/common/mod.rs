#![allow(dead_code)]

use std::path::{Path, PathBuf};

use protobuf::descriptor::FileDescriptorProto;
use protoc_gen_describe::{Ast, Options};

pub fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Every fixture, as a path relative to the fixtures directory.
pub fn fixture_names() -> Vec<String> {
    let root = fixtures();
    let pattern = root.join("**/*.proto");
    let mut names: Vec<String> = glob::glob(pattern.to_str().unwrap())
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap();
            path.strip_prefix(&root)
                .unwrap()
                .to_str()
                .unwrap()
                .replace('\\', "/")
        })
        .collect();
    names.sort();
    names
}

pub fn parse(include: &Path, inputs: &[&str]) -> Vec<FileDescriptorProto> {
    protobuf_parse::Parser::new()
        .pure()
        .include(include)
        .inputs(inputs.iter().map(|input| include.join(input)))
        .parse_and_typecheck()
        .unwrap()
        .file_descriptors
}

pub fn build_from(include: &Path, inputs: &[&str]) -> Ast {
    let targets: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
    Ast::build(parse(include, inputs), &targets)
}

pub fn build(inputs: &[&str]) -> Ast {
    build_from(&fixtures(), inputs)
}

pub fn plain() -> Options {
    Options {
        gogo_options: false,
        ..Options::default()
    }
}
