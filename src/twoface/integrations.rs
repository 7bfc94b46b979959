//! Integrate twoface with other libraries, like Actix-web or Diesel.

use crate::twoface::TfError;
use actix_web::{
    http::{header, StatusCode},
    HttpResponse,
};
use tracing::error;

// Twoface errors can be used as Actix-web errors.
// If a handler returns a Twoface error, the external portion will be shown to the user.
// The internal portion will only be logged.
impl actix_web::ResponseError for TfError {
    fn status_code(&self) -> StatusCode {
        self.external.cause.into()
    }

    fn error_response(&self) -> HttpResponse {
        error!("{}", self.internal);
        let status: StatusCode = self.external.cause.into();
        // Every page on the site is HTML, so errors are too.
        let body = format!(
            "<!DOCTYPE html>\n<html>\n<head><title>{status}</title></head>\n\
             <body>\n<h1>{status}</h1>\n<p>{error}</p>\n</body>\n</html>\n",
            status = status,
            error = self.external,
        );
        HttpResponse::build(status)
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(body)
    }
}
