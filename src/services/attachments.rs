//! Image attachment upload
//!
//! Uploads every image referenced by a record and writes the returned
//! ObjectIds back into `person.images[i].oid`.
//!
//! Uploads run with at most `concurrency` in flight. Results are applied to
//! the record only once every upload succeeded, each by its array index, so a
//! failed run leaves the record without any `oid` fields. The first failure in
//! image order is reported and the remaining uploads are dropped.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use tracing::{debug, info};

use crate::blob::{BlobStore, UploadTicket};
use crate::record::Record;
use crate::types::{ImportError, Result};

/// Upload the images of `record` and attach their identifiers.
///
/// Returns the number of images attached.
pub async fn attach_images(
    blob_store: &dyn BlobStore,
    record: &mut Record,
    concurrency: usize,
) -> Result<usize> {
    let images = record.image_refs();
    info!(
        source = %record.source_name(),
        title = record.title().unwrap_or_default(),
        uploads = images.len(),
        "Attaching images"
    );

    if images.is_empty() {
        return Ok(0);
    }

    // `buffered` yields in index order, so the error surfaced is always the
    // lowest failing index regardless of completion order.
    let tickets: Vec<(usize, UploadTicket)> = stream::iter(images)
        .map(|image| async move {
            let ticket = blob_store
                .upload(Path::new(&image.file))
                .await
                .map_err(|source| ImportError::BlobUpload {
                    file: image.file.clone(),
                    source,
                })?;
            debug!(index = image.index, file = %image.file, oid = %ticket.oid, "Image uploaded");
            Ok::<_, ImportError>((image.index, ticket))
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    for (index, ticket) in &tickets {
        record.set_image_oid(*index, ticket.oid);
    }

    Ok(tickets.len())
}
