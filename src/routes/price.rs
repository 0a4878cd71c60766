//! Competitor price route handlers
//!
//! Price captures arrive as multipart image uploads. The OCR vendor reads
//! the tag, the price fields are pulled out of the recognized text, and
//! the record is persisted for the pricing dashboard.

use crate::auth::{require_role, Claims, Role};
use crate::db::queries::{self, ListQueryBuilder};
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::{
    BatchItemResult, ListPriceRecordsQuery, PriceCapture, PriceRecord, SuccessResponse,
    UpdatePriceRecordRequest,
};
use crate::state::SharedState;
use crate::vendors::ocr::{parse_price_text, PriceReading};
use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    Json,
};
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

/// Maximum number of images accepted by the batch endpoint
pub const BATCH_LIMIT: usize = 10;

const PERSIST_WARNING: &str = "Image was read but the record could not be saved";

/// One uploaded image field
struct ImageUpload {
    file_name: String,
    data: Vec<u8>,
}

/// GET /api/prices
///
/// List price records, optionally filtered by competitor or product name.
pub async fn list_price_records(
    State(state): State<SharedState>,
    Query(params): Query<ListPriceRecordsQuery>,
) -> ApiResult<Json<SuccessResponse<Vec<PriceRecord>>>> {
    debug!("Listing price records");

    let limit = queries::clamp_limit(params.limit, 25, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let (sql, sql_params) = ListQueryBuilder::new(queries::LIST_PRICE_RECORDS)
        .filter_eq("competitor", params.competitor)
        .filter_contains("product_name", params.product)
        .build("created_at DESC", limit, offset);

    let client = state.db_pool.get().await?;
    let rows = client.query(&sql, &queries::param_refs(&sql_params)).await?;

    let records: Vec<PriceRecord> = rows.iter().map(PriceRecord::from_row).collect();

    info!("Listed {} price records", records.len());

    Ok(Json(SuccessResponse::with_data(
        format!("{} price records found.", records.len()),
        records,
    )))
}

/// POST /api/prices
///
/// OCR one price-tag image and persist the recognized record.
///
/// Multipart fields: `competitor` (text), `image` (file).
pub async fn capture_price(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> ApiResult<Json<SuccessResponse<PriceCapture>>> {
    require_role(&claims, Role::Analyst)?;

    let (competitor, mut images) = read_upload(multipart).await?;
    if images.len() != 1 {
        return Err(validation_error("Exactly one image field is required"));
    }
    let image = images.remove(0);

    debug!("Capturing price for competitor '{}' from {}", competitor, image.file_name);

    let (reading, raw_text, sha) = ocr_image(&state, &image).await?;

    let mut warning = None;
    let id = match persist_price(&state, &competitor, &reading, &raw_text, &sha).await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("Failed to persist price record: {}", e);
            warning = Some(PERSIST_WARNING.to_string());
            None
        }
    };

    info!(
        "Price captured: {} {} {} (id: {:?})",
        reading.product_name, reading.price, reading.currency, id
    );

    Ok(Json(
        SuccessResponse::with_data(
            "Price captured successfully.",
            to_response(id, &competitor, reading, raw_text, sha),
        )
        .with_warning(warning),
    ))
}

/// POST /api/prices/batch
///
/// OCR up to [`BATCH_LIMIT`] images sequentially, collecting per-image
/// outcomes. Multipart fields: `competitor` (text), repeated `image` files.
pub async fn capture_prices_batch(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> ApiResult<Json<SuccessResponse<Vec<BatchItemResult<PriceCapture>>>>> {
    require_role(&claims, Role::Analyst)?;

    let (competitor, images) = read_upload(multipart).await?;
    if images.is_empty() {
        return Err(validation_error("Batch must contain at least one image"));
    }
    if images.len() > BATCH_LIMIT {
        return Err(validation_error(format!(
            "Batch size {} exceeds the limit of {}",
            images.len(),
            BATCH_LIMIT
        )));
    }

    debug!("Capturing price batch of {} images for '{}'", images.len(), competitor);

    let mut results = Vec::with_capacity(images.len());

    for (index, image) in images.iter().enumerate() {
        match ocr_image(&state, image).await {
            Ok((reading, raw_text, sha)) => {
                let mut warning = None;
                let id = match persist_price(&state, &competitor, &reading, &raw_text, &sha).await {
                    Ok(id) => Some(id),
                    Err(e) => {
                        warn!("Failed to persist batch price {}: {}", index, e);
                        warning = Some(PERSIST_WARNING.to_string());
                        None
                    }
                };
                results.push(BatchItemResult::ok(
                    index,
                    to_response(id, &competitor, reading, raw_text, sha),
                    warning,
                ));
            }
            Err(e) => {
                warn!("OCR failed for batch image {}: {}", index, e);
                results.push(BatchItemResult::failed(index, e.to_string()));
            }
        }
    }

    let succeeded = results.iter().filter(|r| r.success).count();
    info!("Price batch finished: {}/{} succeeded", succeeded, results.len());

    Ok(Json(SuccessResponse::with_data(
        format!("{} of {} images captured.", succeeded, results.len()),
        results,
    )))
}

/// PUT /api/prices/{id}
///
/// Manually correct a record the OCR got wrong.
pub async fn update_price_record(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePriceRecordRequest>,
) -> ApiResult<Json<SuccessResponse<PriceRecord>>> {
    require_role(&claims, Role::Analyst)?;

    if payload.product_name.is_none() && payload.price.is_none() && payload.currency.is_none() {
        return Err(validation_error("Provide a product name, price, or currency to update"));
    }
    if let Some(price) = payload.price {
        if price <= 0.0 {
            return Err(validation_error("Price must be positive"));
        }
    }

    let client = state.db_pool.get().await?;

    let row = client
        .query_opt(
            "UPDATE price_records
             SET product_name = COALESCE($1, product_name),
                 price = COALESCE($2, price),
                 currency = COALESCE($3, currency),
                 updated_at = $4
             WHERE id = $5
             RETURNING id, competitor, product_name, price, currency, raw_text, image_sha256, created_at, updated_at",
            &[&payload.product_name, &payload.price, &payload.currency, &Utc::now(), &id],
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Price record {} not found", id)))?;

    info!("Price record {} corrected", id);

    Ok(Json(SuccessResponse::with_data(
        "Price record updated successfully.",
        PriceRecord::from_row(&row),
    )))
}

/// Collect the competitor name and image parts from a multipart body
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<ImageUpload>), AppError> {
    let mut competitor: Option<String> = None;
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| validation_error(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "competitor" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| validation_error(format!("Unreadable competitor field: {}", e)))?;
                competitor = Some(value);
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("capture.jpg").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| validation_error(format!("Unreadable image field: {}", e)))?;
                images.push(ImageUpload {
                    file_name,
                    data: data.to_vec(),
                });
            }
            _ => {}
        }
    }

    let competitor = competitor
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| validation_error("Competitor name is required"))?;

    Ok((competitor, images))
}

/// Run one image through the OCR vendor and extract its price fields
async fn ocr_image(
    state: &SharedState,
    image: &ImageUpload,
) -> Result<(PriceReading, String, String), AppError> {
    let extraction = state.ocr.extract_text(&image.data, &image.file_name).await?;
    debug!("OCR returned {} chars (confidence: {:?})", extraction.text.len(), extraction.confidence);

    let reading = parse_price_text(&extraction.text).ok_or_else(|| {
        AppError::BadRequest("Could not recognize a price in the image".to_string())
    })?;

    let sha = format!("{:x}", Sha256::digest(&image.data));

    Ok((reading, extraction.text, sha))
}

/// Insert one price record, returning its id
async fn persist_price(
    state: &SharedState,
    competitor: &str,
    reading: &PriceReading,
    raw_text: &str,
    sha: &str,
) -> Result<i32, AppError> {
    let client = state.db_pool.get().await?;

    let now = Utc::now();
    let row = client
        .query_one(
            "INSERT INTO price_records (competitor, product_name, price, currency, raw_text, image_sha256, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
            &[
                &competitor,
                &reading.product_name,
                &reading.price,
                &reading.currency,
                &raw_text,
                &sha,
                &now,
                &now,
            ],
        )
        .await?;

    Ok(row.get(0))
}

fn to_response(
    id: Option<i32>,
    competitor: &str,
    reading: PriceReading,
    raw_text: String,
    sha: String,
) -> PriceCapture {
    PriceCapture {
        id,
        competitor: competitor.to_string(),
        product_name: reading.product_name,
        price: reading.price,
        currency: reading.currency,
        raw_text,
        image_sha256: sha,
    }
}
