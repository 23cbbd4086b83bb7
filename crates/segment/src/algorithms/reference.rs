use crate::traits::ReferencePlanePolicy;

/// Detect on the last plane of the sorted stack.
///
/// Stacks exported by the imaging rig sort their sharpest plane last, so this is
/// the default. Stacks ordered the other way should use [`FirstPlane`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LastPlane;

impl ReferencePlanePolicy for LastPlane {
    fn select(&self, plane_count: usize) -> Option<usize> {
        plane_count.checked_sub(1)
    }

    fn name(&self) -> String {
        "last_plane".to_string()
    }
}

/// Detect on the first plane of the sorted stack
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPlane;

impl ReferencePlanePolicy for FirstPlane {
    fn select(&self, plane_count: usize) -> Option<usize> {
        (plane_count > 0).then_some(0)
    }

    fn name(&self) -> String {
        "first_plane".to_string()
    }
}

/// Detect on a fixed plane index
#[derive(Debug, Clone, Copy)]
pub struct PlaneAt(pub usize);

impl ReferencePlanePolicy for PlaneAt {
    fn select(&self, plane_count: usize) -> Option<usize> {
        (self.0 < plane_count).then_some(self.0)
    }

    fn name(&self) -> String {
        format!("plane_at({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policies() {
        assert_eq!(LastPlane.select(5), Some(4));
        assert_eq!(LastPlane.select(0), None);
        assert_eq!(FirstPlane.select(5), Some(0));
        assert_eq!(FirstPlane.select(0), None);
        assert_eq!(PlaneAt(2).select(5), Some(2));
        assert_eq!(PlaneAt(5).select(5), None);
    }
}
