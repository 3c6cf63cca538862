use bson::Document as BsonDocument;

/// A single record: its BSON field data.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub data: BsonDocument,
}

impl Document {
    pub fn new(data: BsonDocument) -> Self {
        Self { data }
    }

    /// Top-level field names in stored order.
    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }
}

/// Union of the records' top-level field names, in first-seen order.
pub fn field_union<'a, I>(docs: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut seen: Vec<String> = Vec::new();
    for d in docs {
        for k in d.field_names() {
            if !seen.iter().any(|s| s == k) {
                seen.push(k.clone());
            }
        }
    }
    seen
}
