use std::sync::Arc;

use crate::application::gallery::GalleryService;
use crate::application::mutations::MutationPipeline;

#[derive(Clone)]
pub struct ApiState {
    pub gallery: Arc<GalleryService>,
    pub mutations: Arc<MutationPipeline>,
}

impl ApiState {
    pub fn new(gallery: Arc<GalleryService>, mutations: Arc<MutationPipeline>) -> Self {
        Self { gallery, mutations }
    }
}
