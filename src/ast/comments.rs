use ahash::AHashMap;
use protobuf::descriptor::{source_code_info::Location, SourceCodeInfo};

/// Comments attached to a protobuf item in its source file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comments {
    pub leading_detached: Vec<String>,
    pub leading: String,
    pub trailing: String,
}

impl Comments {
    pub(crate) fn from_location(location: &Location) -> Comments {
        Comments {
            leading_detached: location.leading_detached_comments.clone(),
            leading: location.leading_comments().to_string(),
            trailing: location.trailing_comments().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.leading_detached.is_empty() && self.leading.is_empty() && self.trailing.is_empty()
    }
}

/// Source locations of one file, keyed by descriptor path.
#[derive(Debug, Default)]
pub(crate) struct Locations {
    by_path: AHashMap<Vec<i32>, Comments>,
}

impl Locations {
    pub(crate) fn new(info: &SourceCodeInfo) -> Self {
        let by_path = info
            .location
            .iter()
            .map(|location| (location.path.clone(), Comments::from_location(location)))
            .filter(|(_, comments)| !comments.is_empty())
            .collect();
        Locations { by_path }
    }

    pub(crate) fn get(&self, path: &[i32]) -> Option<Comments> {
        self.by_path.get(path).cloned()
    }
}
