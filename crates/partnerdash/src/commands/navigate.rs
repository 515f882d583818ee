//! Route navigation through the guard, and the route listing.

use serde::Serialize;
use tabled::Tabled;

use partnerdash_core::{Navigation, RouteTable};

use crate::cli::{NavigateArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::{Context, session, util};

#[derive(Serialize)]
struct NavigationReport {
    requested: String,
    landed: String,
    route: String,
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    title: String,
}

pub async fn handle(ctx: &Context, args: &NavigateArgs) -> Result<(), CliError> {
    if !args.anonymous {
        session::sign_in(ctx).await?;
    }

    let navigation = ctx.dashboard.navigate(&args.path).await?;
    let report = match navigation {
        Navigation::Allowed(ref location) => NavigationReport {
            requested: location.path().to_owned(),
            landed: location.path().to_owned(),
            route: location.route().name().to_owned(),
            allowed: true,
            reason: None,
            title: ctx.dashboard.router().title(),
        },
        Navigation::Denied {
            ref requested,
            ref landed,
            ref reason,
        } => NavigationReport {
            requested: requested.path().to_owned(),
            landed: landed.path().to_owned(),
            route: landed.route().name().to_owned(),
            allowed: false,
            reason: Some(reason.to_string()),
            title: ctx.dashboard.router().title(),
        },
    };

    let color = ctx.color;
    let out = output::render_single(
        ctx.format,
        &report,
        |r| {
            let decision = if r.allowed {
                output::success("allowed", color)
            } else {
                let why = r.reason.as_deref().unwrap_or_default();
                format!("{} ({why})", output::failure("denied", color))
            };
            output::detail_lines(&[
                ("Requested", r.requested.clone()),
                ("Decision", decision),
                ("Landed", r.landed.clone()),
                ("Title", r.title.clone()),
            ])
        },
        |r| r.landed.clone(),
    );
    output::print_output(&out, ctx.quiet);
    Ok(())
}

#[derive(Clone, Serialize, Tabled)]
struct RouteRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Permission")]
    permission: String,
    #[tabled(rename = "Role")]
    role: String,
}

/// List the dashboard's routes. Needs no backend.
pub fn list_routes(format: OutputFormat, quiet: bool, color: bool) {
    let rows: Vec<RouteRow> = RouteTable::dashboard()
        .iter()
        .map(|r| RouteRow {
            name: r.name().to_owned(),
            path: r.path().to_owned(),
            title: r.title().to_owned(),
            permission: util::or_dash(r.required_permission()),
            role: util::or_dash(r.required_role()),
        })
        .collect();

    let out = output::render_list(format, &rows, RouteRow::clone, |r| r.path.clone());
    output::print_output(&out, quiet);
    if format == OutputFormat::Table {
        output::notice(
            &output::dim(&format!("{} routes", rows.len()), color),
            quiet,
        );
    }
}
