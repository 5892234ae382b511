use protobuf::descriptor::{DescriptorProto, FieldDescriptorProto};

pub trait DescriptorExt {
    fn nested_type_by_name(&self, name: &str) -> Option<&DescriptorProto>;
    fn field_by_name(&self, name: &str) -> Option<&FieldDescriptorProto>;
    fn get_oneof_fields_by_index(&self, oneof_index: i32) -> Vec<&FieldDescriptorProto>;
    fn is_map_entry(&self) -> bool;
}

impl DescriptorExt for DescriptorProto {
    fn nested_type_by_name(&self, name: &str) -> Option<&DescriptorProto> {
        self.nested_type.iter().find(|nested| nested.name() == name)
    }

    fn field_by_name(&self, name: &str) -> Option<&FieldDescriptorProto> {
        self.field.iter().find(|field| field.name() == name)
    }

    fn get_oneof_fields_by_index(&self, oneof_index: i32) -> Vec<&FieldDescriptorProto> {
        self.field
            .iter()
            .filter(|f| f.has_oneof_index() && f.oneof_index() == oneof_index)
            .collect()
    }

    fn is_map_entry(&self) -> bool {
        self.options.map_entry()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn field(name: &str, oneof_index: Option<i32>) -> FieldDescriptorProto {
        let mut field = FieldDescriptorProto::new();
        field.set_name(name.to_string());
        if let Some(index) = oneof_index {
            field.set_oneof_index(index);
        }
        field
    }

    #[test]
    fn groups_oneof_fields() {
        let mut msg = DescriptorProto::new();
        msg.field = vec![
            field("a", Some(0)),
            field("b", None),
            field("c", Some(1)),
            field("d", Some(0)),
        ];
        let names: Vec<_> = msg
            .get_oneof_fields_by_index(0)
            .iter()
            .map(|f| f.name())
            .collect();
        assert_eq!(names, vec!["a", "d"]);
        assert!(msg.get_oneof_fields_by_index(2).is_empty());
    }

    #[test]
    fn finds_by_name() {
        let mut msg = DescriptorProto::new();
        let mut nested = DescriptorProto::new();
        nested.set_name("Inner".to_string());
        msg.nested_type.push(nested);
        msg.field.push(field("id", None));

        assert!(msg.nested_type_by_name("Inner").is_some());
        assert!(msg.nested_type_by_name("Outer").is_none());
        assert_eq!(msg.field_by_name("id").map(|f| f.name()), Some("id"));
        assert!(!msg.is_map_entry());
    }
}
