use std::fmt;

/// Filter/order/limit parameters appended to a collection path.
///
/// Values are URL-encoded; the operators follow the document API's
/// `field=op.value` convention.
#[derive(Debug, Clone, Default)]
pub struct Query {
    parts: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(self, field: &str, value: impl fmt::Display) -> Self {
        self.push(field, "eq", &value.to_string())
    }

    pub fn neq(self, field: &str, value: impl fmt::Display) -> Self {
        self.push(field, "neq", &value.to_string())
    }

    /// Case-insensitive substring match.
    pub fn ilike(self, field: &str, value: &str) -> Self {
        self.push(field, "ilike", &format!("*{}*", value))
    }

    pub fn in_list<V: fmt::Display>(self, field: &str, values: &[V]) -> Self {
        let joined = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.push(field, "in", &format!("({})", joined))
    }

    /// Matches documents whose array field contains `value`.
    pub fn contains(self, field: &str, value: impl fmt::Display) -> Self {
        self.push(field, "cs", &format!("{{{}}}", value))
    }

    pub fn order(mut self, ordering: &str) -> Self {
        self.parts.push(format!("order={}", urlencoding::encode(ordering)));
        self
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.parts.push(format!("select={}", urlencoding::encode(columns)));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.parts.push(format!("limit={}", limit));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn push(mut self, field: &str, op: &str, value: &str) -> Self {
        self.parts.push(format!("{}={}.{}", field, op, urlencoding::encode(value)));
        self
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("&"))
    }
}
