mod common;

use std::fs;

use pretty_assertions_sorted::assert_eq;
use protoc_gen_describe::{render, Options};

use common::{build, build_from, fixture_names, plain};

#[test]
fn user_file() {
    let ast = build(&["pb/user.proto"]);
    let file = ast.file_by_name("pb/user.proto").unwrap();
    assert_eq!(
        render(&ast, file.into(), &Options::default()),
        r#"syntax = "proto3";
package pb;

option (gogoproto.unmarshaler_all) = true;
option (gogoproto.sizer_all) = true;
option (gogoproto.equal_all) = true;
option (gogoproto.marshaler_all) = true;

import "pb/common.proto";

service Users {
    rpc Get(GetUserRequest) returns (User);
    rpc Watch(Empty) returns (User);
    rpc Upload(User) returns (Empty) {
        option deprecated = true;
    }
}

message User {
    enum Role {
        ROLE_UNSPECIFIED = 0;
        ROLE_ADMIN = 1;
    }
    message Address {
        string city = 1;
        repeated string lines = 2;
    }
    string name = 1;
    int32 age = 2;
    Role role = 3;
    Status status = 4;
    map<string,Address> addresses = 5;
    repeated Address history = 6;
    optional string nickname = 7;
    oneof contact {
        string email = 8;
        string phone = 9;
    }
}

message GetUserRequest {
    string id = 1;
}
"#
    );
}

#[test]
fn proto2_file() {
    let ast = build(&["legacy/record.proto"]);
    let file = ast.file_by_name("legacy/record.proto").unwrap();
    assert_eq!(
        render(&ast, file.into(), &plain()),
        r#"syntax = "proto2";
package legacy;

message Record {
    required int64 id = 1;
    optional string note = 2;
    repeated int32 scores = 3;
    map<int32,Record> children = 4;
    oneof payload {
        string text = 5;
        bytes blob = 6;
    }
}
"#
    );
}

#[test]
fn custom_indent() {
    let ast = build(&["pb/common.proto"]);
    let file = ast.file_by_name("pb/common.proto").unwrap();
    let options = Options {
        indent: 2,
        ..plain()
    };
    assert_eq!(
        render(&ast, file.into(), &options),
        "syntax = \"proto3\";\npackage pb;\n\nmessage Empty {\n}\n\nenum Status {\n  STATUS_UNKNOWN = 0;\n  STATUS_ACTIVE = 1;\n}\n"
    );
}

#[test]
fn indentation_follows_brace_depth() {
    for name in fixture_names() {
        let ast = build(&[name.as_str()]);
        for file in ast.files() {
            let text = render(&ast, file.into(), &Options::default());
            let mut open = 0usize;
            for line in text.lines() {
                if line.ends_with('}') {
                    open -= 1;
                }
                if !line.is_empty() {
                    let indent = line.len() - line.trim_start().len();
                    assert_eq!(indent, 4 * open, "{}: {:?}", name, line);
                }
                if line.ends_with('{') {
                    open += 1;
                }
            }
            assert_eq!(open, 0, "{}", name);
        }
    }
}

#[test]
fn rendering_is_repeatable() {
    for name in fixture_names() {
        let ast = build(&[name.as_str()]);
        let file = ast.file_by_name(&name).unwrap();
        let first = render(&ast, file.into(), &Options::default());
        let second = render(&ast, file.into(), &Options::default());
        assert_eq!(first, second);
    }
}

/// Rendered files parse again and describe themselves identically.
#[test]
fn rendered_files_round_trip() {
    let out = std::path::Path::new(env!("CARGO_TARGET_TMPDIR")).join("round_trip");

    for name in fixture_names() {
        let ast = build(&[name.as_str()]);
        let dir = out.join(name.replace('/', "_"));
        for file in ast.files() {
            let path = dir.join(ast.file(file).name());
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, render(&ast, file.into(), &plain())).unwrap();
        }

        let reparsed = build_from(&dir, &[name.as_str()]);
        for file in ast.files() {
            let name = ast.file(file).name();
            let again = reparsed.file_by_name(name).unwrap();
            assert_eq!(
                render(&ast, file.into(), &plain()),
                render(&reparsed, again.into(), &plain()),
                "{}",
                name
            );
        }
    }
}
