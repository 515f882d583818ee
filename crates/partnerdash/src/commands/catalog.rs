//! Product tags, delivery times and stock statuses.

use tabled::Tabled;

use partnerdash_core::partnerdash_api::resources::{ProductDeliveryTime, ProductLabel};

use crate::cli::{CatalogArgs, CatalogCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

#[derive(Tabled)]
struct LabelRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Identifier")]
    identifier: String,
    #[tabled(rename = "Caption")]
    caption: String,
}

impl From<&ProductLabel> for LabelRow {
    fn from(l: &ProductLabel) -> Self {
        Self {
            id: util::or_dash(l.id),
            name: l.name.clone(),
            identifier: l.identifier.clone(),
            caption: util::or_dash(l.caption.as_ref()),
        }
    }
}

#[derive(Tabled)]
struct DeliveryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Identifier")]
    identifier: String,
    #[tabled(rename = "Color")]
    color: String,
}

impl From<&ProductDeliveryTime> for DeliveryRow {
    fn from(d: &ProductDeliveryTime) -> Self {
        Self {
            id: util::or_dash(d.id),
            name: d.name.clone(),
            identifier: d.identifier.clone(),
            color: util::or_dash(d.color.as_ref()),
        }
    }
}

pub async fn handle(ctx: &Context, args: CatalogArgs) -> Result<(), CliError> {
    let out = match args.command {
        CatalogCommand::Tags => {
            let tags = ctx.dashboard.product_tags().list().await?;
            output::render_list(ctx.format, &tags, |l| LabelRow::from(l), |l| l.identifier.clone())
        }
        CatalogCommand::StockStatuses => {
            let statuses = ctx.dashboard.stock_statuses().list().await?;
            output::render_list(ctx.format, &statuses, |l| LabelRow::from(l), |l| {
                l.identifier.clone()
            })
        }
        CatalogCommand::DeliveryTimes => {
            let times = ctx.dashboard.delivery_times().list().await?;
            output::render_list(ctx.format, &times, |d| DeliveryRow::from(d), |d| {
                d.identifier.clone()
            })
        }
    };
    output::print_output(&out, ctx.quiet);
    Ok(())
}
