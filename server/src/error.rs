use std::convert::Infallible;

use warp::{http::StatusCode, Rejection, Reply};

use courier::api::DispatchResult;

/// Wrap the shared Courier error type so Reject can be impl'd
#[derive(Debug)]
pub struct Error(pub courier::Error);

impl warp::reject::Reject for Error {}

impl From<courier::Error> for Error {
    fn from(err: courier::Error) -> Self {
        Self(err)
    }
}

/// Field problems are the caller's to fix; everything else is ours.
pub fn status_for(err: &courier::Error) -> StatusCode {
    match *err {
        courier::Error::Validation(_) => StatusCode::BAD_REQUEST,
        courier::Error::Configuration(_)
        | courier::Error::Verification(_)
        | courier::Error::Send { .. }
        | courier::Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps rejections to HTTP return codes.
///
/// Every response is a JSON `DispatchResult`, so the front-end only ever has
/// one shape to render.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let status_code;
    let resp;

    if let Some(e) = err.find::<Error>() {
        status_code = status_for(&e.0);
        resp = DispatchResult::from(&e.0);
    } else if err.is_not_found() {
        status_code = StatusCode::NOT_FOUND;
        resp = DispatchResult {
            message: "Not found".to_string(),
            ..Default::default()
        };
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        status_code = StatusCode::PAYLOAD_TOO_LARGE;
        resp = DispatchResult {
            message: "Submission is too large".to_string(),
            ..Default::default()
        };
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        status_code = StatusCode::METHOD_NOT_ALLOWED;
        resp = DispatchResult {
            message: "Method not allowed".to_string(),
            ..Default::default()
        };
    } else {
        // Unreadable bodies and anything else warp gave up on
        log::error!("Unhandled rejection: {:?}", err);
        status_code = StatusCode::INTERNAL_SERVER_ERROR;
        resp = DispatchResult::from(&courier::Error::Unknown(format!("{:?}", err)));
    }

    Ok(warp::reply::with_status(warp::reply::json(&resp), status_code))
}
