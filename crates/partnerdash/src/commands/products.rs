//! Product command handlers.

use std::path::{Path, PathBuf};

use tabled::Tabled;

use partnerdash_core::partnerdash_api::ImageUpload;
use partnerdash_core::partnerdash_api::resources::{Product, ProductImage};

use crate::cli::{ProductsArgs, ProductsCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Delivery")]
    delivery: String,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            id: util::or_dash(p.id),
            name: p.name.clone(),
            code: p.product_code.clone(),
            price: p.price.to_string(),
            status: util::or_dash(p.product_status.as_ref().map(|s| s.name.clone())),
            delivery: util::or_dash(p.product_delivery_time.as_ref().map(|d| d.name.clone())),
        }
    }
}

#[derive(Tabled)]
struct ImageRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Main")]
    main: &'static str,
    #[tabled(rename = "URL")]
    url: String,
}

impl From<&ProductImage> for ImageRow {
    fn from(i: &ProductImage) -> Self {
        Self {
            id: i.id,
            main: if i.main { "yes" } else { "" },
            url: i.url.clone(),
        }
    }
}

fn detail(p: &Product) -> String {
    output::detail_lines(&[
        ("ID", util::or_dash(p.id)),
        ("Name", p.name.clone()),
        ("Code", p.product_code.clone()),
        ("EAN", p.ean.clone()),
        ("Price", p.price.to_string()),
        ("Size", p.size.clone()),
        ("Color", p.color.clone()),
        (
            "Status",
            util::or_dash(p.product_status.as_ref().map(|s| s.name.clone())),
        ),
        (
            "Delivery",
            util::or_dash(p.product_delivery_time.as_ref().map(|d| d.name.clone())),
        ),
        (
            "Tags",
            p.tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", "),
        ),
        ("Updated", util::or_dash(p.updated_at)),
    ])
}

fn not_found(id: u64) -> impl FnOnce(partnerdash_core::partnerdash_api::Error) -> CliError {
    move |e| util::not_found(e, "product", id, "products list")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: ProductsArgs) -> Result<(), CliError> {
    let products = ctx.dashboard.products();

    match args.command {
        ProductsCommand::List => {
            let all = products.list().await?;
            let out = output::render_list(ctx.format, &all, |p| ProductRow::from(p), |p| {
                util::or_dash(p.id)
            });
            output::print_output(&out, ctx.quiet);
        }

        ProductsCommand::Get { id } => {
            let product = products.get(id).await.map_err(not_found(id))?;
            let out = output::render_single(ctx.format, &product, detail, |p| {
                util::or_dash(p.id)
            });
            output::print_output(&out, ctx.quiet);
        }

        ProductsCommand::Create { from_file } => {
            let product: Product = util::read_json_file(&from_file)?;
            let created = products.create(&product).await?;
            output::notice(
                &format!(
                    "Product created: {}",
                    util::or_dash(created.and_then(|p| p.id))
                ),
                ctx.quiet,
            );
        }

        ProductsCommand::Update {
            id,
            from_file,
            publish,
        } => {
            let product: Product = util::read_json_file(&from_file)?;
            products
                .update(id, &product, publish)
                .await
                .map_err(not_found(id))?;
            output::notice(&format!("Product {id} updated"), ctx.quiet);
        }

        ProductsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete product {id}?"), ctx.yes)? {
                return Ok(());
            }
            products.delete(id).await.map_err(not_found(id))?;
            output::notice(&format!("Product {id} deleted"), ctx.quiet);
        }

        ProductsCommand::Status { id, status } => {
            products
                .change_status(id, &status)
                .await
                .map_err(not_found(id))?;
            output::notice(&format!("Product {id} is now {status}"), ctx.quiet);
        }

        ProductsCommand::Publish { id } => {
            products.publish(id).await.map_err(not_found(id))?;
            output::notice(&format!("Product {id} published"), ctx.quiet);
        }

        ProductsCommand::Images { id } => {
            let images = products.images(id).await.map_err(not_found(id))?;
            let out = output::render_list(ctx.format, &images, |i| ImageRow::from(i), |i| i.url.clone());
            output::print_output(&out, ctx.quiet);
        }

        ProductsCommand::UploadImages { id, files } => {
            let images = files
                .iter()
                .map(PathBuf::as_path)
                .map(read_image)
                .collect::<Result<Vec<_>, CliError>>()?;
            let count = images.len();
            products
                .upload_images(id, images)
                .await
                .map_err(not_found(id))?;
            output::notice(&format!("Uploaded {count} image(s) to product {id}"), ctx.quiet);
        }

        ProductsCommand::SetMainImage { id, image_id } => {
            products
                .set_main_image(id, image_id)
                .await
                .map_err(not_found(id))?;
            output::notice(&format!("Image {image_id} is now the main image"), ctx.quiet);
        }

        ProductsCommand::DeleteImage { id, image_id } => {
            if !util::confirm(&format!("Delete image {image_id} of product {id}?"), ctx.yes)? {
                return Ok(());
            }
            products
                .delete_image(id, image_id)
                .await
                .map_err(not_found(id))?;
            output::notice(&format!("Image {image_id} deleted"), ctx.quiet);
        }
    }
    Ok(())
}

fn read_image(path: &Path) -> Result<ImageUpload, CliError> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map_or_else(|| "image".into(), |n| n.to_string_lossy().into_owned());
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("png") => Some("image/png"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        _ => None,
    };
    let upload = ImageUpload::new(file_name, bytes);
    Ok(match mime {
        Some(mime) => upload.with_mime(mime),
        None => upload,
    })
}
