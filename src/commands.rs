use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use bytes::Bytes;
use serde::Serialize;
use time::OffsetDateTime;

use shopadmin::auth::dto::{AdminRegisterRequest, RegisterRequest};
use shopadmin::auth::{check_route, GateDecision, TokenClaims};
use shopadmin::batch::{BatchJob, UploadPhase, TEMPLATE_FILE_NAME};
use shopadmin::products::{load_image, Page, PageRequest, Product, ProductInput};
use shopadmin::suppliers::{
    ApplicationStatus, Decision, SupplierApplication, SupplierApplicationRequest,
};
use shopadmin::AppState;

use crate::cli::{
    AdminCommand, BatchCommand, Commands, PageArgs, ProductArgs, ProductCommand, SupplierCommand,
};

fn emit<T: Serialize>(json: bool, value: &T, table: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        table(value);
    }
    Ok(())
}

/// Applies the same access rule the matching screen would.
fn guard(state: &AppState, route: &str) -> anyhow::Result<()> {
    match check_route(route, state.session.current().as_ref()) {
        GateDecision::Allow => Ok(()),
        GateDecision::RedirectToLogin => bail!("not logged in; run `shopadmin login` first"),
        GateDecision::RedirectToDefault => bail!("an administrator account is required"),
    }
}

pub async fn run(state: &AppState, command: Commands, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Login {
            identifier,
            password,
        } => {
            let session = state.auth().login(&identifier, &password).await?;
            println!("Logged in as {}", session.user.display_name());
        }
        Commands::Signup {
            username,
            email,
            password,
        } => {
            let session = state
                .auth()
                .signup(RegisterRequest {
                    username,
                    email,
                    password,
                })
                .await?;
            println!("Account created; logged in as {}", session.user.display_name());
        }
        Commands::Logout => {
            state.auth().logout().await?;
            println!("Logged out");
        }
        Commands::Whoami { refresh } => whoami(state, refresh, json).await?,
        Commands::Admin { command } => admin(state, command, json).await?,
        Commands::Products { command } => {
            guard(state, "/products")?;
            products(state, command, json).await?
        }
        Commands::Batch { command } => {
            guard(state, "/products/batch")?;
            batch(state, command, json).await?
        }
        Commands::Supplier { command } => {
            guard(state, "/supplier")?;
            supplier(state, command, json).await?
        }
    }
    Ok(())
}

async fn whoami(state: &AppState, refresh: bool, json: bool) -> anyhow::Result<()> {
    if refresh {
        state.auth().refresh_current_user().await?;
    }
    let Some(session) = state.session.current() else {
        println!("Not logged in");
        return Ok(());
    };
    let claims = TokenClaims::peek(&session.token).ok();
    if json {
        let value = serde_json::json!({
            "user": session.user,
            "claims": claims,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    let user = &session.user;
    println!("user:  {}", user.display_name());
    println!("email: {}", user.email.as_deref().unwrap_or("-"));
    println!("role:  {}", user.role.as_deref().unwrap_or("-"));
    if let Some(claims) = claims {
        println!("roles: {}", claims.roles.join(", "));
        if let Some(exp) = claims.expires_at() {
            let expired = claims.is_expired_at(OffsetDateTime::now_utc());
            println!("token expires {exp}{}", if expired { " (expired)" } else { "" });
        }
    }
    Ok(())
}

async fn admin(state: &AppState, command: AdminCommand, json: bool) -> anyhow::Result<()> {
    match command {
        AdminCommand::Login { username, password } => {
            let session = state.auth().admin_login(&username, &password).await?;
            println!("Logged in as admin {}", session.user.display_name());
        }
        AdminCommand::Signup {
            username,
            email,
            password,
            admin_secret,
        } => {
            let session = state
                .auth()
                .admin_signup(AdminRegisterRequest {
                    username,
                    email,
                    password,
                    admin_secret,
                })
                .await?;
            println!("Admin created; logged in as {}", session.user.display_name());
        }
        AdminCommand::Users => {
            guard(state, "/admin/users")?;
            let users = state.admin_users().list().await?;
            emit(json, &users, |users| {
                println!("{:>6}  {:<24} {:<32} ROLES", "ID", "NAME", "EMAIL");
                for u in users {
                    println!(
                        "{:>6}  {:<24} {:<32} {}",
                        u.id,
                        u.display_name(),
                        u.email.as_deref().unwrap_or("-"),
                        u.role_list().join(",")
                    );
                }
            })?;
        }
        AdminCommand::DeleteUser { id } => {
            guard(state, "/admin/users")?;
            state.admin_users().delete(id).await?;
            println!("Deleted user {id}");
        }
        AdminCommand::Applications { status, page, size } => {
            guard(state, "/admin/suppliers")?;
            let status = status
                .map(|s| s.parse::<ApplicationStatus>())
                .transpose()?;
            let page = state
                .suppliers()
                .list_applications(status, page, size)
                .await?;
            emit(json, &page, |page| {
                print_applications(&page.content);
                print_page_footer(page);
            })?;
        }
        AdminCommand::Review { id, decision, note } => {
            guard(state, "/admin/suppliers")?;
            let decision: Decision = decision.parse()?;
            let app = state.suppliers().review(id, decision, note).await?;
            emit(json, &app, |app| println!("Application {} is now {}", app.id, app.status))?;
        }
    }
    Ok(())
}

fn product_input(args: &ProductArgs) -> anyhow::Result<ProductInput> {
    Ok(ProductInput::from_form(
        &args.name,
        args.description.as_deref().unwrap_or_default(),
        &args.price,
        args.stock.as_deref().unwrap_or_default(),
    )?)
}

fn page_request(args: &PageArgs) -> PageRequest {
    PageRequest::new(args.page, args.size).sorted(args.sort.clone())
}

async fn products(state: &AppState, command: ProductCommand, json: bool) -> anyhow::Result<()> {
    let service = state.products();
    match command {
        ProductCommand::List { page } => {
            let mut listing = state
                .product_listing()
                .starting_at(page.page, page.size, &page.sort)?;
            listing.load().await?;
            emit(json, listing.data(), |data| {
                print_products(&data.content);
                print_page_footer(data);
            })?;
        }
        ProductCommand::Get { id } => {
            let product = service.get(id).await?;
            emit(json, &product, |p| print_products(std::slice::from_ref(p)))?;
        }
        ProductCommand::Create { product, seller } => {
            let input = product_input(&product)?;
            let created = match (&product.image, &seller) {
                (None, None) => service.create(&input).await?,
                (image, seller) => {
                    let image = match image {
                        Some(path) => Some(load_image(path).await?),
                        None => None,
                    };
                    service
                        .create_with_image(&input, image, seller.as_deref())
                        .await?
                }
            };
            emit(json, &created, |p| println!("Created product {} ({})", p.id, p.name))?;
        }
        ProductCommand::Update { id, product } => {
            let input = product_input(&product)?;
            let updated = match &product.image {
                Some(path) => {
                    let image = load_image(path).await?;
                    service.update_with_image(id, &input, Some(image)).await?
                }
                None => service.update(id, &input).await?,
            };
            emit(json, &updated, |p| println!("Updated product {} ({})", p.id, p.name))?;
        }
        ProductCommand::Delete { id } => {
            service.delete(id).await?;
            println!("Deleted product {id}");
        }
        ProductCommand::Supplied { page } => {
            let data = service.supplied(&page_request(&page)).await?;
            emit(json, &data, |data| {
                print_products(&data.content);
                print_page_footer(data);
            })?;
        }
        ProductCommand::Mine { page } => {
            let data = service.mine(&page_request(&page)).await?;
            emit(json, &data, |data| {
                print_products(&data.content);
                print_page_footer(data);
            })?;
        }
        ProductCommand::Search { query, page } => {
            let data = service.search(&query, &page_request(&page)).await?;
            emit(json, &data, |data| {
                print_products(&data.content);
                print_page_footer(data);
            })?;
        }
    }
    Ok(())
}

async fn batch(state: &AppState, command: BatchCommand, json: bool) -> anyhow::Result<()> {
    match command {
        BatchCommand::Upload { file, no_wait } => {
            let body = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let mut upload = state.batch_upload();
            if !upload.select_file(name, Bytes::from(body)) {
                bail!(upload.error().unwrap_or("invalid file").to_string());
            }
            upload.upload().await;
            if let Some(err) = upload.error() {
                bail!(err.to_string());
            }
            if !no_wait {
                if let Some(mut rx) = upload.subscribe() {
                    loop {
                        let snapshot = rx.borrow_and_update().clone();
                        if let (false, Some(job)) = (json, &snapshot.job) {
                            eprintln!("job {}: {}", job.job_execution_id, job.status);
                        }
                        if !snapshot.polling || rx.changed().await.is_err() {
                            break;
                        }
                    }
                }
            }
            let job = upload
                .status()
                .ok_or_else(|| anyhow!("no job status received"))?;
            emit(json, &job, print_job)?;
            match upload.phase() {
                UploadPhase::Failed => bail!("import job failed"),
                UploadPhase::Idle if !no_wait => {
                    bail!("lost track of job {}; check `shopadmin batch status`", job.job_execution_id)
                }
                _ => {}
            }
        }
        BatchCommand::Status { job_id } => {
            let job = state.batch().status(job_id).await?;
            emit(json, &job, print_job)?;
        }
        BatchCommand::Template { output } => {
            let bytes = state.batch().template().await?;
            let path = output.unwrap_or_else(|| PathBuf::from(TEMPLATE_FILE_NAME));
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Saved template to {}", path.display());
        }
    }
    Ok(())
}

async fn supplier(state: &AppState, command: SupplierCommand, json: bool) -> anyhow::Result<()> {
    let service = state.suppliers();
    match command {
        SupplierCommand::Dashboard => {
            let dash = service.dashboard().await?;
            emit(json, &dash, |d| {
                println!("supplier:   {}", if d.supplier { "yes" } else { "no" });
                println!("can apply:  {}", if d.can_apply { "yes" } else { "no" });
                if let Some(status) = d.latest_status {
                    println!("latest:     {status}");
                }
                for alert in &d.alerts {
                    println!("[{}] {}", alert.severity, alert.message);
                }
                if !d.applications.is_empty() {
                    println!();
                    print_applications(&d.applications);
                }
            })?;
        }
        SupplierCommand::Apply {
            business_name,
            business_email,
            business_phone,
            website,
            message,
        } => {
            let app = service
                .apply(SupplierApplicationRequest {
                    business_name,
                    business_email,
                    business_phone,
                    website,
                    message,
                })
                .await?;
            emit(json, &app, |a| println!("Application {} submitted ({})", a.id, a.status))?;
        }
        SupplierCommand::Applications => {
            let apps = service.my_applications().await?;
            emit(json, &apps, |apps| print_applications(apps))?;
        }
    }
    Ok(())
}

fn print_products(items: &[Product]) {
    println!("{:>6}  {:<32} {:>10} {:>6}  OWNER", "ID", "NAME", "PRICE", "STOCK");
    for p in items {
        println!(
            "{:>6}  {:<32} {:>10.2} {:>6}  {}",
            p.id,
            p.name,
            p.price,
            p.stock_quantity.map(|q| q.to_string()).unwrap_or_else(|| "-".into()),
            p.owner_username.as_deref().unwrap_or("-")
        );
    }
}

fn print_page_footer<T>(page: &Page<T>) {
    println!(
        "page {} of {} ({} total){}{}",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements,
        if page.has_prev() { "  [prev]" } else { "" },
        if page.has_next() { "  [next]" } else { "" },
    );
}

fn print_applications(apps: &[SupplierApplication]) {
    println!("{:>6}  {:<28} {:<28} {:<9} SUBMITTED", "ID", "BUSINESS", "EMAIL", "STATUS");
    for a in apps {
        println!(
            "{:>6}  {:<28} {:<28} {:<9} {}",
            a.id,
            a.business_name,
            a.business_email.as_deref().unwrap_or("-"),
            a.status.as_str(),
            a.submitted_at.as_deref().unwrap_or("-")
        );
    }
}

fn print_job(job: &BatchJob) {
    println!("job:      {}", job.job_execution_id);
    println!("status:   {}", job.status);
    if let Some(total) = job.total_records {
        println!(
            "records:  {total} total, {} ok, {} failed, {} skipped",
            job.success_count.unwrap_or(0),
            job.failure_count.unwrap_or(0),
            job.skip_count.unwrap_or(0)
        );
    }
    if let Some(msg) = &job.message {
        println!("message:  {msg}");
    }
    for err in &job.errors {
        println!("  ! {err}");
    }
}
