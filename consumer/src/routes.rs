//! Pattern-to-handler registry construction

use std::sync::Arc;

use users_core::dispatch::payloads::{
    ChangeEmailPayload, ChangePasswordPayload, ChangeUsernamePayload, ForgotPasswordPayload,
    ResetPasswordPayload, SendEmailVerificationTokenPayload, UpdateUserPayload,
    VerifyEmailPayload,
};
use users_core::dispatch::{patterns, Router};
use users_core::repositories::CredentialStore;
use users_core::services::{AccountService, EmailNotifier, PasswordHasher};

/// Bind every recognized pattern to its account service handler
pub fn build_router<S, H, N>(service: Arc<AccountService<S, H, N>>) -> Router
where
    S: CredentialStore + 'static,
    H: PasswordHasher + 'static,
    N: EmailNotifier + 'static,
{
    let mut router = Router::new();

    let svc = Arc::clone(&service);
    router.register(patterns::UPDATE_USER, move |payload: UpdateUserPayload| {
        let svc = Arc::clone(&svc);
        async move { svc.update_profile(payload.account_id, payload.profile()).await }
    });

    let svc = Arc::clone(&service);
    router.register(
        patterns::CHANGE_USERNAME,
        move |payload: ChangeUsernamePayload| {
            let svc = Arc::clone(&svc);
            async move {
                svc.change_username(payload.account_id, &payload.new_username)
                    .await
            }
        },
    );

    let svc = Arc::clone(&service);
    router.register(
        patterns::CHANGE_PASSWORD,
        move |payload: ChangePasswordPayload| {
            let svc = Arc::clone(&svc);
            async move {
                svc.change_password(
                    payload.account_id,
                    &payload.old_password_proof,
                    &payload.new_password,
                )
                .await
            }
        },
    );

    let svc = Arc::clone(&service);
    router.register(patterns::CHANGE_EMAIL, move |payload: ChangeEmailPayload| {
        let svc = Arc::clone(&svc);
        async move { svc.change_email(payload.account_id, &payload.new_email).await }
    });

    let svc = Arc::clone(&service);
    router.register(
        patterns::SEND_EMAIL_VERIFICATION_TOKEN,
        move |payload: SendEmailVerificationTokenPayload| {
            let svc = Arc::clone(&svc);
            async move { svc.send_email_verification(payload.account_id).await }
        },
    );

    let svc = Arc::clone(&service);
    router.register(patterns::VERIFY_EMAIL, move |payload: VerifyEmailPayload| {
        let svc = Arc::clone(&svc);
        async move { svc.verify_email(&payload.raw_token).await }
    });

    let svc = Arc::clone(&service);
    router.register(
        patterns::FORGOT_PASSWORD,
        move |payload: ForgotPasswordPayload| {
            let svc = Arc::clone(&svc);
            async move { svc.forgot_password(&payload.email).await }
        },
    );

    let svc = Arc::clone(&service);
    router.register(
        patterns::RESET_PASSWORD,
        move |payload: ResetPasswordPayload| {
            let svc = Arc::clone(&svc);
            async move { svc.reset_password(&payload.raw_token, &payload.new_password).await }
        },
    );

    router
}
