//! `RequesterRegistry` — integer codes for the models that request isolation.

use epi_core::RequesterId;

/// Maps requester names to codes in registration order.
///
/// The registry is owned by [`Isolation`](crate::Isolation); other models
/// borrow it once at construction to obtain their code.  Registering the
/// same name twice returns the same code, so codes only depend on the order
/// in which models are built.
#[derive(Clone, Debug, Default)]
pub struct RequesterRegistry {
    names: Vec<String>,
}

impl RequesterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str) -> RequesterId {
        if let Some(code) = self.code(name) {
            return code;
        }
        self.names.push(name.to_owned());
        RequesterId((self.names.len() - 1) as u32)
    }

    pub fn code(&self, name: &str) -> Option<RequesterId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| RequesterId(i as u32))
    }

    pub fn name(&self, code: RequesterId) -> Option<&str> {
        self.names.get(code.index()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RequesterId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (RequesterId(i as u32), n.as_str()))
    }
}
