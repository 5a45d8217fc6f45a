use std::sync::Arc;

use bytes::BufMut;
use futures::{pin_mut, TryStreamExt};
use warp::{http::StatusCode, multipart::FormData, reply::Reply, Rejection};

use courier::submission::{FormFields, Upload};
use courier::Dispatcher;

use super::error::Error;

/// Only this part is treated as a file; other fields are read as text.
const IMAGE_FIELD: &str = "image";

/// Drains a multipart body into named text fields plus the optional image.
async fn collect_form(form: FormData) -> Result<FormFields, warp::Error> {
    let mut fields = FormFields::new();

    pin_mut!(form);
    while let Some(part) = form.try_next().await? {
        let name = part.name().to_string();
        let filename = part.filename().map(String::from);
        let content_type = part.content_type().map(String::from);

        let data = part
            .stream()
            .try_fold(Vec::<u8>::new(), |mut buf, chunk| {
                buf.put(chunk);
                async move { Ok(buf) }
            })
            .await?;

        if name == IMAGE_FIELD {
            fields.insert_image(Upload {
                filename,
                content_type,
                data,
            });
        } else if filename.is_none() {
            fields.insert_text(name, String::from_utf8_lossy(&data).into_owned());
        } else {
            log::debug!("Ignoring unexpected file field {}", name);
        }
    }

    Ok(fields)
}

/// Handles a form submission end to end.
pub async fn submit(form: FormData, dispatcher: Arc<Dispatcher>) -> Result<impl Reply, Rejection> {
    let fields = collect_form(form).await.map_err(|e| {
        log::error!("Failed to read submission body: {}", e);
        warp::reject::custom(Error::from(courier::Error::Unknown(e.to_string())))
    })?;

    let result = dispatcher
        .dispatch(fields)
        .await
        .map_err(Error::from)
        .map_err(warp::reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&result),
        StatusCode::OK,
    ))
}
