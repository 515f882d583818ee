//! Shop command handlers.

use tabled::Tabled;

use partnerdash_core::partnerdash_api::resources::Shop;

use crate::cli::{ShopsArgs, ShopsCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

#[derive(Tabled)]
struct ShopRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Visitors")]
    visitors: String,
    #[tabled(rename = "Revenues")]
    revenues: String,
}

impl From<&Shop> for ShopRow {
    fn from(s: &Shop) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            visitors: util::or_dash(s.visitors),
            revenues: util::or_dash(s.revenues.as_ref()),
        }
    }
}

pub async fn handle(ctx: &Context, args: ShopsArgs) -> Result<(), CliError> {
    let shops = ctx.dashboard.shops();

    match args.command {
        ShopsCommand::List => {
            let all = shops.list().await?;
            let out = output::render_list(ctx.format, &all, |s| ShopRow::from(s), |s| s.id.to_string());
            output::print_output(&out, ctx.quiet);
        }

        ShopsCommand::Get { id } => {
            let shop = shops
                .get(id)
                .await
                .map_err(|e| util::not_found(e, "shop", id, "shops list"))?;
            let out = output::render_single(
                ctx.format,
                &shop,
                |s| {
                    output::detail_lines(&[
                        ("ID", s.id.to_string()),
                        ("Name", s.name.clone()),
                        ("Visitors", util::or_dash(s.visitors)),
                        ("Revenues", util::or_dash(s.revenues.as_ref())),
                    ])
                },
                |s| s.id.to_string(),
            );
            output::print_output(&out, ctx.quiet);
        }
    }
    Ok(())
}
