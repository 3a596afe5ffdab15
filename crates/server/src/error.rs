use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use error_stack::Report;
use event_notification_common::error::{EventNotificationError, IntoHttpResponse};

/// Converts a report into a response with the error's own status.
pub fn to_error_response(report: Report<EventNotificationError>) -> Response {
    let error = report.current_context();
    (error.status_code(), error.user_message()).into_response()
}

/// Converts a report into a `500`, whatever its variant.
///
/// The notification route answers every failure this way so the vendor retries
/// delivery.
pub fn to_internal_error_response(report: Report<EventNotificationError>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        report.current_context().user_message(),
    )
        .into_response()
}
