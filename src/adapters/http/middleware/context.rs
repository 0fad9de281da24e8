use actix_web::{
  Error, HttpMessage, HttpResponse,
  body::EitherBody,
  dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::{
  future::{Ready, ready},
  rc::Rc,
};
use uuid::Uuid;

use crate::adapters::http::dtos::ErrorResponse;

/// Request context middleware
///
/// This middleware:
/// 1. Generates a UUID v4 request ID and adds it to response headers as X-Request-ID
/// 2. Extracts the tenant and acting user from the X-Tenant-Id / X-User-Id headers
/// 3. Attaches a RequestContext to request extensions for downstream handlers
/// 4. Returns 401 Unauthorized if either identity header is missing or malformed
///
/// Authentication itself happens at the gateway; this service trusts the
/// identity headers it receives.
///
/// # Example
///
/// ```no_run
/// use actix_web::App;
/// # use attar_billing::adapters::http::middleware::context::RequestContextMiddleware;
///
/// let app = App::new()
///   .wrap(RequestContextMiddleware::default());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContextMiddleware;

impl RequestContextMiddleware {
  /// Creates a new request context middleware
  pub fn new() -> Self {
    Self
  }
}

impl<S, B> Transform<S, ServiceRequest> for RequestContextMiddleware
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Transform = RequestContextMiddlewareService<S>;
  type InitError = ();
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ready(Ok(RequestContextMiddlewareService {
      service: Rc::new(service),
    }))
  }
}

pub struct RequestContextMiddlewareService<S> {
  service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestContextMiddlewareService<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  forward_ready!(service);

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let service = Rc::clone(&self.service);

    Box::pin(async move {
      let request_id = Uuid::new_v4();

      let tenant_id = match extract_uuid_header(&req, "X-Tenant-Id") {
        Ok(id) => id,
        Err(e) => {
          let (request, _) = req.into_parts();
          let response = HttpResponse::Unauthorized().json(e).map_into_right_body();
          return Ok(ServiceResponse::new(request, response));
        }
      };

      let user_id = match extract_uuid_header(&req, "X-User-Id") {
        Ok(id) => id,
        Err(e) => {
          let (request, _) = req.into_parts();
          let response = HttpResponse::Unauthorized().json(e).map_into_right_body();
          return Ok(ServiceResponse::new(request, response));
        }
      };

      let context = RequestContext {
        request_id,
        tenant_id,
        user_id,
      };
      req.extensions_mut().insert(context);

      tracing::Span::current().record("request_id", request_id.to_string());

      let mut res = service.call(req).await?;

      res.headers_mut().insert(
        actix_web::http::header::HeaderName::from_static("x-request-id"),
        actix_web::http::header::HeaderValue::from_str(&request_id.to_string())
          .unwrap_or_else(|_| actix_web::http::header::HeaderValue::from_static("invalid-uuid")),
      );

      Ok(res.map_into_left_body())
    })
  }
}

/// Per-request identity attached by RequestContextMiddleware
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
  pub request_id: Uuid,
  pub tenant_id: Uuid,
  pub user_id: Uuid,
}

fn extract_uuid_header(req: &ServiceRequest, name: &str) -> Result<Uuid, ErrorResponse> {
  req
    .headers()
    .get(name)
    .and_then(|h| h.to_str().ok())
    .and_then(|s| Uuid::parse_str(s).ok())
    .ok_or_else(|| ErrorResponse {
      error: "unauthorized".to_string(),
      message: format!("Missing or invalid {} header", name),
    })
}

/// Extension trait to easily extract the request context from a request
pub trait RequestContextExt {
  /// Get the request context from request extensions
  ///
  /// Returns None if the context is not present (middleware not configured).
  fn request_context(&self) -> Option<RequestContext>;
}

impl RequestContextExt for actix_web::HttpRequest {
  fn request_context(&self) -> Option<RequestContext> {
    self.extensions().get::<RequestContext>().copied()
  }
}
