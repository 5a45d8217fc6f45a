use std::convert::Infallible;
use std::sync::Arc;

use courier::Dispatcher;

use warp::Filter;

/// Hands every request a handle to the shared dispatcher
pub fn with_dispatcher(
    dispatcher: Arc<Dispatcher>,
) -> impl Filter<Extract = (Arc<Dispatcher>,), Error = Infallible> + Clone {
    warp::any().map(move || dispatcher.clone())
}
