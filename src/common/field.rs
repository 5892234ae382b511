use protobuf::descriptor::{field_descriptor_proto::Type, DescriptorProto, FieldDescriptorProto};

use super::message::DescriptorExt;

/// protoc names the synthetic message behind `map<K, V> foo` as `FooEntry`.
pub const MAP_ENTRY_SUFFIX: &str = "Entry";

pub trait FieldDescriptorExt {
    /// Human readable type of the field, as it would be written in a
    /// `.proto` file.
    ///
    /// References resolve to their last dotted segment. A reference to a map
    /// entry nested in `enclosing` becomes `map<K,V>`; when the entry or its
    /// `key`/`value` fields can't be found the bare segment is returned.
    /// Message, enum and group fields without a reference resolve to `""`.
    fn type_display_name(&self, enclosing: Option<&DescriptorProto>) -> String;

    fn is_message(&self) -> bool;
    fn is_enum(&self) -> bool;
}

impl FieldDescriptorExt for FieldDescriptorProto {
    fn type_display_name(&self, enclosing: Option<&DescriptorProto>) -> String {
        if self.has_type_name() {
            let name = self.type_name().rsplit('.').next().unwrap_or_default();
            if name.ends_with(MAP_ENTRY_SUFFIX) {
                if let Some(map) = enclosing.and_then(|m| map_type_name(m, name)) {
                    return map;
                }
            }
            return name.to_string();
        }

        match self.type_.map(|t| t.enum_value()) {
            Some(Ok(ty)) => primitive_type_name(ty).to_string(),
            _ => String::new(),
        }
    }

    fn is_message(&self) -> bool {
        matches!(self.type_(), Type::TYPE_MESSAGE | Type::TYPE_GROUP)
    }

    fn is_enum(&self) -> bool {
        self.type_() == Type::TYPE_ENUM
    }
}

fn map_type_name(enclosing: &DescriptorProto, entry_name: &str) -> Option<String> {
    let entry = enclosing.nested_type_by_name(entry_name)?;
    let key = entry.field_by_name("key")?.type_display_name(Some(entry));
    let value = entry.field_by_name("value")?.type_display_name(Some(entry));
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some(format!("map<{},{}>", key, value))
}

pub fn primitive_type_name(ty: Type) -> &'static str {
    match ty {
        Type::TYPE_DOUBLE => "double",
        Type::TYPE_FLOAT => "float",
        Type::TYPE_INT64 => "int64",
        Type::TYPE_UINT64 => "uint64",
        Type::TYPE_INT32 => "int32",
        Type::TYPE_FIXED64 => "fixed64",
        Type::TYPE_FIXED32 => "fixed32",
        Type::TYPE_BOOL => "bool",
        Type::TYPE_STRING => "string",
        Type::TYPE_BYTES => "bytes",
        Type::TYPE_UINT32 => "uint32",
        Type::TYPE_SFIXED32 => "sfixed32",
        Type::TYPE_SFIXED64 => "sfixed64",
        Type::TYPE_SINT32 => "sint32",
        Type::TYPE_SINT64 => "sint64",
        Type::TYPE_GROUP | Type::TYPE_MESSAGE | Type::TYPE_ENUM => "",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use protobuf::descriptor::field_descriptor_proto::Label;

    fn field(name: &str, ty: Type, type_name: Option<&str>) -> FieldDescriptorProto {
        let mut field = FieldDescriptorProto::new();
        field.set_name(name.to_string());
        field.set_type(ty);
        if let Some(type_name) = type_name {
            field.set_type_name(type_name.to_string());
        }
        field
    }

    fn map_entry(name: &str, key: FieldDescriptorProto, value: FieldDescriptorProto) -> DescriptorProto {
        let mut entry = DescriptorProto::new();
        entry.set_name(name.to_string());
        entry.options.mut_or_insert_default().set_map_entry(true);
        entry.field = vec![key, value];
        entry
    }

    #[test]
    fn primitives_use_canonical_names() {
        assert_eq!(field("a", Type::TYPE_SINT64, None).type_display_name(None), "sint64");
        assert_eq!(field("a", Type::TYPE_BYTES, None).type_display_name(None), "bytes");
    }

    #[test]
    fn enum_without_reference_is_unresolved() {
        assert_eq!(field("a", Type::TYPE_ENUM, None).type_display_name(None), "");
        assert_eq!(field("a", Type::TYPE_MESSAGE, None).type_display_name(None), "");
    }

    #[test]
    fn classifies_references() {
        assert!(field("a", Type::TYPE_MESSAGE, Some(".pb.A")).is_message());
        assert!(field("a", Type::TYPE_GROUP, Some(".pb.A")).is_message());
        assert!(field("a", Type::TYPE_ENUM, Some(".pb.E")).is_enum());
        assert!(!field("a", Type::TYPE_STRING, None).is_message());
    }

    #[test]
    fn missing_type_is_unresolved() {
        let mut f = FieldDescriptorProto::new();
        f.set_name("a".to_string());
        assert_eq!(f.type_display_name(None), "");
    }

    #[test]
    fn references_keep_last_segment() {
        let f = field("a", Type::TYPE_MESSAGE, Some(".pb.Outer.Inner"));
        assert_eq!(f.type_display_name(None), "Inner");
    }

    #[test]
    fn map_entry_becomes_map_type() {
        let mut msg = DescriptorProto::new();
        msg.set_name("User".to_string());
        msg.nested_type.push(map_entry(
            "AttrsEntry",
            field("key", Type::TYPE_STRING, None),
            field("value", Type::TYPE_ENUM, Some(".pb.Kind")),
        ));
        let mut attrs = field("attrs", Type::TYPE_MESSAGE, Some(".pb.User.AttrsEntry"));
        attrs.set_label(Label::LABEL_REPEATED);

        let key = msg.nested_type[0].field[0].type_display_name(None);
        let value = msg.nested_type[0].field[1].type_display_name(None);
        assert_eq!(
            attrs.type_display_name(Some(&msg)),
            format!("map<{},{}>", key, value)
        );
        assert_eq!(attrs.type_display_name(Some(&msg)), "map<string,Kind>");
    }

    #[test]
    fn map_entry_without_nested_type_falls_back() {
        let msg = DescriptorProto::new();
        let attrs = field("attrs", Type::TYPE_MESSAGE, Some(".pb.User.AttrsEntry"));
        assert_eq!(attrs.type_display_name(Some(&msg)), "AttrsEntry");
        assert_eq!(attrs.type_display_name(None), "AttrsEntry");
    }

    #[test]
    fn map_entry_without_value_falls_back() {
        let mut msg = DescriptorProto::new();
        let mut entry = DescriptorProto::new();
        entry.set_name("AttrsEntry".to_string());
        entry.field.push(field("key", Type::TYPE_STRING, None));
        msg.nested_type.push(entry);
        let attrs = field("attrs", Type::TYPE_MESSAGE, Some(".pb.User.AttrsEntry"));
        assert_eq!(attrs.type_display_name(Some(&msg)), "AttrsEntry");
    }
}
