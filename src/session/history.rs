use std::sync::Arc;

use parking_lot::RwLock;

use crate::foundation::core::ImageUri;

/// Append-only list of captured output URIs, shared across screens.
///
/// Cloning yields another handle to the same list.
#[derive(Clone, Debug, Default)]
pub struct GeneratedImageHistory {
    images: Arc<RwLock<Vec<ImageUri>>>,
}

impl GeneratedImageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, uri: ImageUri) {
        self.images.write().push(uri);
    }

    /// Copy of the current entries, oldest first.
    pub fn images(&self) -> Vec<ImageUri> {
        self.images.read().clone()
    }

    pub fn last(&self) -> Option<ImageUri> {
        self.images.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_list() {
        let a = GeneratedImageHistory::new();
        let b = a.clone();
        a.append(ImageUri::new("file:///1.jpg"));
        b.append(ImageUri::new("file:///2.jpg"));
        assert_eq!(
            a.images(),
            vec![ImageUri::new("file:///1.jpg"), ImageUri::new("file:///2.jpg")]
        );
        assert_eq!(b.last(), Some(ImageUri::new("file:///2.jpg")));
        assert_eq!(b.len(), 2);
    }
}
