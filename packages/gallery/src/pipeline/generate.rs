use common::media_type::{extension_for_mime, mime_from_filename};
use common::storage::key::normalize_key;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entity::image::SourceType;
use crate::error::PipelineError;
use crate::generation::{
    GenerationOptions, GenerationRequest, ReferenceImage, SplitResponse, split_fragments,
};
use crate::models::image::{GenerateRequest, GenerateResponse, GeneratedImage, GeneratedPart};

use super::{AssetPipeline, StagedImage};

/// Unique, sortable name for a generated image.
pub(crate) fn generated_name(mime_type: &str) -> String {
    format!(
        "generated-{}{}",
        Uuid::now_v7().simple(),
        extension_for_mime(mime_type)
    )
}

impl AssetPipeline {
    /// Run the generator and persist every image it returns.
    ///
    /// All images are staged in the object store first and then recorded in
    /// one metadata transaction, so either every image of the response is
    /// kept or none is.
    #[instrument(skip(self, request), fields(workspace = %request.workspace, refs = request.images.len()))]
    pub async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, PipelineError> {
        let prompt = request.prompt.trim();
        if prompt.is_empty() {
            return Err(PipelineError::Validation("prompt cannot be empty".into()));
        }

        let workspace = match request.workspace.trim() {
            "" => self.settings.default_workspace.as_str(),
            name => name,
        };
        let ws = self.resolve_workspace(workspace).await?;

        let generator = self.generator.as_ref().ok_or_else(|| {
            PipelineError::ExternalCapability("no image generator is configured".into())
        })?;

        let ref_paths: Vec<String> = request
            .images
            .iter()
            .map(|p| normalize_key(p.trim()))
            .collect();
        let mut references = Vec::with_capacity(ref_paths.len());
        for path in &ref_paths {
            let data = self
                .objects
                .get(path)
                .await
                .map_err(|e| PipelineError::object_read("fetch reference image", e))?;
            references.push(ReferenceImage {
                data,
                mime_type: mime_from_filename(path),
            });
        }

        let output = generator
            .generate(GenerationRequest {
                prompt: prompt.to_string(),
                images: references,
                options: GenerationOptions {
                    web_search: request.enable_web_search,
                },
            })
            .await?;
        let fragments = output.into_first_fragments().ok_or_else(|| {
            PipelineError::ExternalCapability("model returned empty output".into())
        })?;

        let SplitResponse {
            mut parts,
            history,
            pending,
        } = split_fragments(fragments);

        let mut staged: Vec<StagedImage> = Vec::with_capacity(pending.len());
        for image in &pending {
            let name = generated_name(&image.mime_type);
            match self
                .stage(&ws.name, &name, &image.data, &image.mime_type)
                .await
            {
                Ok(s) => staged.push(s),
                Err(cause) => return Err(self.discard_staged(&staged, cause).await),
            }
        }

        if !staged.is_empty() {
            let rows = staged
                .iter()
                .map(|s| {
                    s.new_image(
                        ws.id,
                        SourceType::Generate,
                        Some(prompt.to_string()),
                        ref_paths.clone(),
                        history.clone(),
                    )
                })
                .collect();
            if let Err(e) = self.images.create_batch(rows).await {
                let cause = PipelineError::StoreWrite(format!("save generated image records: {e}"));
                return Err(self.discard_staged(&staged, cause).await);
            }
        }

        for (image, stored) in pending.iter().zip(&staged) {
            if let Some(part) = parts.get_mut(image.part_index) {
                *part = GeneratedPart::Image {
                    image: GeneratedImage {
                        mime_type: stored.mime_type.clone(),
                        path: stored.original.key.clone(),
                        url: stored.original.url.clone(),
                    },
                };
            }
        }

        info!(workspace = %ws.name, images = staged.len(), "Generated images");
        Ok(GenerateResponse { parts })
    }
}
