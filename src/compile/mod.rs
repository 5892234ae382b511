use std::{panic, thread};

use log::{debug, error};
use protobuf::{
    plugin::{
        code_generator_response::{Feature, File},
        CodeGeneratorRequest, CodeGeneratorResponse,
    },
    Message,
};

use crate::{ast::Ast, json::to_json, options::Options, print::render, Error, Result};

/// Runs the plugin over a serialized `CodeGeneratorRequest`.
///
/// Only an undecodable request is an error here. Anything that goes wrong
/// afterwards is reported to protoc through the response's `error` field.
pub fn compile(buffer: Vec<u8>) -> Result<Vec<u8>> {
    let request = CodeGeneratorRequest::parse_from_bytes(&buffer)?;
    let response = Options::parse(request.parameter())
        .and_then(|options| compile_impl(&request, &options))
        .unwrap_or_else(|err| {
            error!("{}", err);
            let mut response = CodeGeneratorResponse::new();
            response.set_error(err.to_string());
            response
        });

    Ok(response.write_to_bytes()?)
}

pub fn compile_impl(
    request: &CodeGeneratorRequest,
    options: &Options,
) -> Result<CodeGeneratorResponse> {
    let ast = Ast::from_request(request);

    let targets = request
        .file_to_generate
        .iter()
        .map(|name| {
            ast.file_by_name(name)
                .ok_or_else(|| Error::UnknownFile(name.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    let outputs = thread::scope(|s| {
        let handles: Vec<_> = targets
            .iter()
            .map(|&file| {
                let ast = &ast;
                s.spawn(move || -> Result<Vec<File>> {
                    let name = ast.file(file).name();
                    debug!("rendering {}", name);

                    let stem = name.strip_suffix(".proto").unwrap_or(name);
                    let mut files = vec![new_file(
                        format!("{}{}", stem, options.suffix),
                        render(ast, file.into(), options),
                    )];
                    if options.json {
                        let json = serde_json::to_string_pretty(&to_json(ast, file.into()))?;
                        files.push(new_file(format!("{}.ast.json", stem), json));
                    }
                    Ok(files)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|err| panic::resume_unwind(err)))
            .collect::<Vec<_>>()
    });

    let mut resp = CodeGeneratorResponse::new();
    resp.set_supported_features(Feature::FEATURE_PROTO3_OPTIONAL as u64);
    for files in outputs {
        resp.file.extend(files?);
    }
    Ok(resp)
}

pub(crate) fn new_file(path_name: String, body: String) -> File {
    let mut file = File::new();
    file.set_name(path_name);
    file.set_content(body);
    file
}

#[cfg(test)]
mod test {
    use super::*;
    use protobuf::descriptor::{
        field_descriptor_proto::Type, DescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    };

    fn request(parameter: &str, targets: &[&str]) -> CodeGeneratorRequest {
        let mut common = FileDescriptorProto::new();
        common.set_name("pb/common.proto".to_string());
        common.set_package("pb".to_string());
        common.set_syntax("proto3".to_string());
        let mut empty = DescriptorProto::new();
        empty.set_name("Empty".to_string());
        common.message_type.push(empty);

        let mut user = FileDescriptorProto::new();
        user.set_name("pb/user.proto".to_string());
        user.set_package("pb".to_string());
        user.set_syntax("proto3".to_string());
        user.dependency.push("pb/common.proto".to_string());
        let mut message = DescriptorProto::new();
        message.set_name("User".to_string());
        let mut field = FieldDescriptorProto::new();
        field.set_name("empty".to_string());
        field.set_number(1);
        field.set_type(Type::TYPE_MESSAGE);
        field.set_type_name(".pb.Empty".to_string());
        message.field.push(field);
        user.message_type.push(message);

        let mut request = CodeGeneratorRequest::new();
        request.set_parameter(parameter.to_string());
        request.proto_file = vec![common, user];
        request.file_to_generate = targets.iter().map(|t| t.to_string()).collect();
        request
    }

    fn run(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
        let bytes = compile(request.write_to_bytes().unwrap()).unwrap();
        CodeGeneratorResponse::parse_from_bytes(&bytes).unwrap()
    }

    #[test]
    fn renders_only_targets() {
        let response = run(&request("gogo_options=false", &["pb/user.proto"]));
        assert!(!response.has_error());
        assert_eq!(response.file.len(), 1);
        assert_eq!(response.file[0].name(), "pb/user.describe.proto");
        assert_eq!(
            response.file[0].content(),
            "syntax = \"proto3\";\npackage pb;\n\nimport \"pb/common.proto\";\n\nmessage User {\n    Empty empty = 1;\n}\n"
        );
    }

    #[test]
    fn outputs_follow_request_order() {
        let response = run(&request(
            "suffix=.txt,json=true",
            &["pb/user.proto", "pb/common.proto"],
        ));
        let names: Vec<_> = response.file.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "pb/user.txt",
                "pb/user.ast.json",
                "pb/common.txt",
                "pb/common.ast.json",
            ]
        );
        let json: serde_json::Value = serde_json::from_str(response.file[1].content()).unwrap();
        assert_eq!(json["name"], "pb/user.proto");
    }

    #[test]
    fn unknown_target_is_reported() {
        let response = run(&request("", &["pb/missing.proto"]));
        assert_eq!(response.error(), "no file named pb/missing.proto");
        assert!(response.file.is_empty());
    }

    #[test]
    fn bad_parameter_is_reported() {
        let response = run(&request("indent=wide", &["pb/user.proto"]));
        assert!(response.has_error());
    }

    #[test]
    fn undecodable_request_is_an_error() {
        assert!(matches!(compile(vec![0xff, 0xff]), Err(Error::Decode(_))));
    }

    #[test]
    fn announces_proto3_optional() {
        let response = run(&request("", &["pb/user.proto"]));
        assert_eq!(
            response.supported_features(),
            Feature::FEATURE_PROTO3_OPTIONAL as u64
        );
    }
}
