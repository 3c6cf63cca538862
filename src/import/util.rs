pub fn field_to_bson(field: &str, infer: bool) -> bson::Bson {
    if !infer {
        return bson::Bson::String(field.to_string());
    }
    if field.is_empty() {
        return bson::Bson::Null;
    }
    if let Ok(i) = field.parse::<i64>() {
        return bson::Bson::Int64(i);
    }
    if let Ok(f) = field.parse::<f64>()
        && f.is_finite()
    {
        return bson::Bson::Double(f);
    }
    match field.to_lowercase().as_str() {
        "true" => bson::Bson::Boolean(true),
        "false" => bson::Bson::Boolean(false),
        _ => bson::Bson::String(field.to_string()),
    }
}
