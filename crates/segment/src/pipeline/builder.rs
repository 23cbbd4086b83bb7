use stack_common::RunConfig;

use crate::{
    algorithms::LastPlane,
    error::Result,
    io::ImageCrateAccess,
    pipeline::{DEFAULT_OBJECT_LIMIT, PipelineDriver},
    traits::{ImageAccess, ReferencePlanePolicy},
};

/// Builder for creating pipeline drivers with a fluent API
pub struct PipelineBuilder {
    access: Option<Box<dyn ImageAccess>>,
    reference_policy: Option<Box<dyn ReferencePlanePolicy>>,
    object_limit: usize,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            access: None,
            reference_policy: None,
            object_limit: DEFAULT_OBJECT_LIMIT,
        }
    }

    /// Set the image backend (replaces any existing one)
    pub fn with_image_access<A>(mut self, access: A) -> Self
    where
        A: ImageAccess + 'static,
    {
        self.access = Some(Box::new(access));
        self
    }

    /// Set the reference plane policy (replaces any existing one)
    pub fn with_reference_policy<P>(mut self, policy: P) -> Self
    where
        P: ReferencePlanePolicy + 'static,
    {
        self.reference_policy = Some(Box::new(policy));
        self
    }

    pub fn with_object_limit(mut self, limit: usize) -> Self {
        self.object_limit = limit;
        self
    }

    /// Build with [`ImageCrateAccess`] and [`LastPlane`] where nothing was set
    pub fn build(self) -> PipelineDriver {
        let access = self.access.unwrap_or_else(|| Box::new(ImageCrateAccess::new()));
        let reference_policy = self.reference_policy.unwrap_or_else(|| Box::new(LastPlane));
        PipelineDriver::new(access, reference_policy, self.object_limit)
    }

    /// Default driver whose backend loads the run's label font, if any
    pub fn for_run(run: &RunConfig) -> Result<PipelineDriver> {
        Ok(Self::new()
            .with_image_access(ImageCrateAccess::for_run(run)?)
            .build())
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
