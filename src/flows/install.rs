//! Installation wizard flow.
//!
//! Walks a fresh checkout from the first page of the wizard to the
//! "Installation finished" page: database connection, the user form (first
//! with invalid input, then for real), skipping mail setup.

use super::{expect_rejection, expect_success};
use crate::ensure;
use crate::error::HarnessResult;
use crate::runner::{Flow, FlowContext, StepFuture};

pub const INSTALL_PATH: &str = "/";
pub const FINISHED_MARKER: &str = "Installation finished";

pub const MSG_USERNAME_LENGTH: &str = "The username should be between 5 and 32 characters long";
pub const MSG_PASSWORD_LENGTH: &str = "The password should be at least 6 characters long";
pub const MSG_PASSWORD_MISMATCH: &str = "The given passwords do not match";
pub const MSG_INVALID_EMAIL: &str = "Invalid email address";

const DATABASE_ENCODING: &str = "UTF-8";
const ADMIN_EMAIL: &str = "test@test.com";

pub fn flow() -> Flow<FlowContext> {
    Flow::new("Install")
        .step("Testing connection…", test_connection)
        .step("Testing database setup…", test_database_setup)
        .step("Testing invalid usernames…", test_invalid_usernames)
        .step("Testing invalid password…", test_invalid_password)
        .step("Testing not matching password…", test_not_matching_passwords)
        .step("Testing invalid email…", test_invalid_email)
        .step("Testing user creation…", test_create_user)
        .step("Testing skip mail configuration…", test_skip_mail_config)
        .step("Testing complete setup…", test_complete_setup)
}

fn test_connection(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        ctx.session.get_page(INSTALL_PATH).await?;
        Ok(())
    })
}

fn test_database_setup(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let db = &ctx.database;
        let port = db.port.to_string();
        let form = [
            ("host", db.host.as_str()),
            ("port", port.as_str()),
            ("username", db.username.as_str()),
            ("password", db.password.as_str()),
            ("database", db.database.as_str()),
            ("type", db.dbms.as_str()),
            ("encoding", DATABASE_ENCODING),
        ];
        let obj = ctx.session.post_json(INSTALL_PATH, &form).await?;
        expect_success(&obj, "database setup")
    })
}

fn test_invalid_usernames(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        for username in ["a".to_string(), "a".repeat(33)] {
            submit_user_rejected(
                ctx,
                &username,
                "123456",
                "123456",
                None,
                MSG_USERNAME_LENGTH,
            )
            .await?;
        }
        Ok(())
    })
}

fn test_invalid_password(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let username = ctx.admin.username.clone();
        submit_user_rejected(ctx, &username, "1", "1", None, MSG_PASSWORD_LENGTH).await
    })
}

fn test_not_matching_passwords(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let username = ctx.admin.username.clone();
        submit_user_rejected(ctx, &username, "1", "2", None, MSG_PASSWORD_MISMATCH).await
    })
}

fn test_invalid_email(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let admin = ctx.admin.clone();
        submit_user_rejected(
            ctx,
            &admin.username,
            &admin.password,
            &admin.password,
            Some("123abc"),
            MSG_INVALID_EMAIL,
        )
        .await
    })
}

fn test_create_user(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let admin = &ctx.admin;
        let form = [
            ("username", admin.username.as_str()),
            ("password", admin.password.as_str()),
            ("confirmPassword", admin.password.as_str()),
            ("email", ADMIN_EMAIL),
        ];
        let obj = ctx.session.post_json(INSTALL_PATH, &form).await?;
        expect_success(&obj, "user creation")
    })
}

fn test_skip_mail_config(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let obj = ctx.session.post_json(INSTALL_PATH, &[("skip", "true")]).await?;
        expect_success(&obj, "skip mail configuration")
    })
}

fn test_complete_setup(ctx: &mut FlowContext) -> StepFuture<'_> {
    Box::pin(async move {
        let res = ctx.session.get_page(INSTALL_PATH).await?;
        ensure!(
            res.body.contains(FINISHED_MARKER),
            "expected the install page to report {:?}",
            FINISHED_MARKER
        );
        Ok(())
    })
}

async fn submit_user_rejected(
    ctx: &FlowContext,
    username: &str,
    password: &str,
    confirm_password: &str,
    email: Option<&str>,
    expected: &str,
) -> HarnessResult<()> {
    let mut form = vec![
        ("username", username),
        ("password", password),
        ("confirmPassword", confirm_password),
    ];
    if let Some(email) = email {
        form.push(("email", email));
    }

    let obj = ctx.session.post_json(INSTALL_PATH, &form).await?;
    expect_rejection(&obj, &format!("user form ({})", username), expected)
}
