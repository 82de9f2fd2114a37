use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use chrono::Utc;
use futures_util::TryStreamExt;
use tracing::info;
use uuid::Uuid;

use crate::application::post_service::PostService;
use crate::data::post_repository::{OrderColumn, OrderDirection, PostgresPostRepository};
use crate::domain::error::{DomainError, FieldError};
use crate::infrastructure::assets::{FsAssetStore, ImageUpload};
use crate::presentation::dto::{DestroyRequest, ListQuery, PostForm, PostPageView, PostView};
use crate::presentation::handlers::request_id;
use crate::presentation::utils::{AuthenticatedAdmin, ClientIp};

type Service = PostService<PostgresPostRepository, FsAssetStore>;

// hard ceiling while draining the upload stream; the validation layer applies
// the real per-image limit
const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

#[get("/")]
pub async fn index(
    req: HttpRequest,
    ip: ClientIp,
    query: web::Query<ListQuery>,
    service: web::Data<Service>,
) -> Result<HttpResponse, DomainError> {
    let page_view = render_page(&query, &ip, &service).await?;

    info!(request_id = %request_id(&req), "posts retrieved");
    Ok(HttpResponse::Ok().json(page_view))
}

#[post("/post/store")]
pub async fn store(
    req: HttpRequest,
    ip: ClientIp,
    payload: Multipart,
    service: web::Data<Service>,
) -> Result<HttpResponse, DomainError> {
    let (form, image) = read_post_form(payload).await?;
    let now = Utc::now();

    let post = match form.id {
        Some(id) => service.update(id, form, &ip.0, now, image).await?,
        None => service.create(form, ip.0.clone(), image).await?,
    };

    info!(
        request_id = %request_id(&req),
        post_id = %post.id,
        "post stored"
    );

    Ok(HttpResponse::Ok().json(PostView::render(&post, &ip.0, now, service.assets())))
}

#[post("/post/destroy")]
pub async fn destroy(
    req: HttpRequest,
    ip: ClientIp,
    payload: web::Json<DestroyRequest>,
    service: web::Data<Service>,
) -> Result<HttpResponse, DomainError> {
    service.delete(payload.id, &ip.0, Utc::now()).await?;

    info!(
        request_id = %request_id(&req),
        post_id = %payload.id,
        "post destroyed"
    );

    Ok(HttpResponse::NoContent().finish())
}

#[get("/dashboard")]
pub async fn dashboard(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    ip: ClientIp,
    query: web::Query<ListQuery>,
    service: web::Data<Service>,
) -> Result<HttpResponse, DomainError> {
    let page_view = render_page(&query, &ip, &service).await?;

    info!(
        request_id = %request_id(&req),
        admin = %admin.name,
        "dashboard retrieved"
    );
    Ok(HttpResponse::Ok().json(page_view))
}

#[post("/post/storeAsAdmin")]
pub async fn store_as_admin(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    ip: ClientIp,
    payload: Multipart,
    service: web::Data<Service>,
) -> Result<HttpResponse, DomainError> {
    let (form, image) = read_post_form(payload).await?;
    let post = service.admin_store(form, ip.0.clone(), image).await?;

    info!(
        request_id = %request_id(&req),
        admin = %admin.name,
        post_id = %post.id,
        "post stored by admin"
    );

    Ok(HttpResponse::Ok().json(PostView::render(&post, &ip.0, Utc::now(), service.assets())))
}

#[post("/post/destroyAsAdmin")]
pub async fn destroy_as_admin(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    payload: web::Json<DestroyRequest>,
    service: web::Data<Service>,
) -> Result<HttpResponse, DomainError> {
    service.admin_delete(payload.id).await?;

    info!(
        request_id = %request_id(&req),
        admin = %admin.name,
        post_id = %payload.id,
        "post destroyed by admin"
    );

    Ok(HttpResponse::NoContent().finish())
}

async fn render_page(
    query: &ListQuery,
    ip: &ClientIp,
    service: &Service,
) -> Result<PostPageView, DomainError> {
    let column = OrderColumn::parse(query.order_column.as_deref());
    let direction = OrderDirection::parse(query.order_direction.as_deref());
    let page = service
        .list(column, direction, query.page(), query.page_size())
        .await?;

    let now = Utc::now();
    let posts = page
        .posts
        .iter()
        .map(|p| PostView::render(p, &ip.0, now, service.assets()))
        .collect();

    Ok(PostPageView {
        posts,
        total: page.total,
        page: query.page(),
        page_size: query.page_size(),
        order_column: column.as_str(),
        order_direction: direction.as_str(),
    })
}

/// Drains the multipart stream into the submission form plus the optional
/// image upload. Unknown parts are ignored.
async fn read_post_form(
    mut payload: Multipart,
) -> Result<(PostForm, Option<ImageUpload>), DomainError> {
    let mut id = None;
    let mut name = String::new();
    let mut email = String::new();
    let mut text = String::new();
    let mut image = None;

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        let part = field.name().unwrap_or_default().to_owned();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(DomainError::Validation(vec![FieldError::new(
                    "image",
                    "is too large",
                )]));
            }
            bytes.extend_from_slice(&chunk);
        }

        match part.as_str() {
            "id" => {
                let raw = String::from_utf8_lossy(&bytes);
                let raw = raw.trim();
                if !raw.is_empty() {
                    id = Some(Uuid::parse_str(raw).map_err(|_| {
                        DomainError::Validation(vec![FieldError::new("id", "is not a valid id")])
                    })?);
                }
            }
            "name" => name = String::from_utf8_lossy(&bytes).into_owned(),
            "email" => email = String::from_utf8_lossy(&bytes).into_owned(),
            "text" => text = String::from_utf8_lossy(&bytes).into_owned(),
            "image" => {
                if let Some(filename) = filename {
                    image = Some(ImageUpload { filename, bytes });
                }
            }
            _ => {}
        }
    }

    Ok((
        PostForm {
            id,
            name,
            email,
            text,
        },
        image,
    ))
}

fn malformed(e: actix_multipart::MultipartError) -> DomainError {
    DomainError::Validation(vec![FieldError::new(
        "form",
        format!("malformed multipart payload: {}", e),
    )])
}
