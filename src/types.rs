/// Symbolic, namespace-qualified model name such as `app.widget`.
pub type ModelName = String;
