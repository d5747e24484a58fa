//! Sign-up, sign-in and sign-out flows.

use snapgram_core::{validate, SIGN_IN, SIGN_UP};

use super::{fail, navigate, SubmitOutcome};
use crate::app::SnapgramApp;
use crate::form::FormState;
use crate::mutation::MutationHandle;
use crate::mutations::{CreateUserAccount, SignInAccount, SignOutAccount};
use crate::ui::{notices, Route, UiEffects};

/// Create an account, then open a session with the same credentials.
#[derive(Debug)]
pub struct SignUpFlow {
    app: SnapgramApp,
    form: FormState,
    create_account: MutationHandle<CreateUserAccount>,
    sign_in: MutationHandle<SignInAccount>,
}

impl SignUpFlow {
    /// Empty sign-up form with fresh handles.
    pub fn new(app: &SnapgramApp) -> Self {
        Self {
            app: app.clone(),
            form: FormState::new(&SIGN_UP),
            create_account: app.create_user_account(),
            sign_in: app.sign_in_account(),
        }
    }

    /// Current form state.
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Form state for editing.
    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    /// Handle of the account creation step.
    pub fn create_account_handle(&self) -> &MutationHandle<CreateUserAccount> {
        &self.create_account
    }

    /// Handle of the sign-in step.
    pub fn sign_in_handle(&self) -> &MutationHandle<SignInAccount> {
        &self.sign_in
    }

    /// Either step is in flight.
    pub fn is_loading(&self) -> bool {
        self.create_account.is_pending() || self.sign_in.is_pending()
    }

    /// Validate, create the account, sign in and resolve the user.
    ///
    /// Stops at the first failing step with its notice; on success the form
    /// is reset and the route is home.
    pub async fn submit(&mut self, ui: &dyn UiEffects) -> SubmitOutcome {
        let new_user = match validate(&SIGN_UP, self.form.to_new_user()) {
            Ok(valid) => valid.into_inner(),
            Err(errors) => {
                tracing::debug!(%errors, "sign-up form rejected");
                self.form.apply_errors(&errors);
                return SubmitOutcome::Invalid(errors);
            }
        };
        let credentials = new_user.credentials();

        if let Err(e) = self.create_account.mutate(new_user).await {
            return fail(ui, notices::SIGN_UP_FAILED, Some(e));
        }

        if let Err(e) = self.sign_in.mutate(credentials).await {
            return fail(ui, notices::SIGN_IN_FAILED, Some(e));
        }

        if !self.app.check_auth_user().await {
            return fail(ui, notices::AUTH_CHECK_FAILED, None);
        }

        self.form.reset();
        navigate(ui, Route::Home)
    }
}

/// Open a session and confirm it resolves to a user.
#[derive(Debug)]
pub struct SignInFlow {
    app: SnapgramApp,
    form: FormState,
    sign_in: MutationHandle<SignInAccount>,
}

impl SignInFlow {
    /// Empty sign-in form.
    pub fn new(app: &SnapgramApp) -> Self {
        Self {
            app: app.clone(),
            form: FormState::new(&SIGN_IN),
            sign_in: app.sign_in_account(),
        }
    }

    /// Current form state.
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Form state for editing.
    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    /// The sign-in handle.
    pub fn sign_in_handle(&self) -> &MutationHandle<SignInAccount> {
        &self.sign_in
    }

    /// Sign-in is in flight.
    pub fn is_loading(&self) -> bool {
        self.sign_in.is_pending()
    }

    /// Validate, sign in and resolve the user, then go home.
    pub async fn submit(&mut self, ui: &dyn UiEffects) -> SubmitOutcome {
        let credentials = match validate(&SIGN_IN, self.form.to_credentials()) {
            Ok(valid) => valid.into_inner(),
            Err(errors) => {
                tracing::debug!(%errors, "sign-in form rejected");
                self.form.apply_errors(&errors);
                return SubmitOutcome::Invalid(errors);
            }
        };

        if let Err(e) = self.sign_in.mutate(credentials).await {
            return fail(ui, notices::SIGN_IN_FAILED, Some(e));
        }

        if !self.app.check_auth_user().await {
            return fail(ui, notices::AUTH_CHECK_FAILED, None);
        }

        self.form.reset();
        navigate(ui, Route::Home)
    }
}

/// Close the session and go to the sign-in route.
#[derive(Debug)]
pub struct SignOutFlow {
    sign_out: MutationHandle<SignOutAccount>,
}

impl SignOutFlow {
    /// Flow with a fresh sign-out handle.
    pub fn new(app: &SnapgramApp) -> Self {
        Self {
            sign_out: app.sign_out_account(),
        }
    }

    /// The sign-out handle.
    pub fn sign_out_handle(&self) -> &MutationHandle<SignOutAccount> {
        &self.sign_out
    }

    /// Sign out; a failure shows a notice and stays put.
    pub async fn submit(&self, ui: &dyn UiEffects) -> SubmitOutcome {
        match self.sign_out.mutate(()).await {
            Ok(()) => navigate(ui, Route::SignIn),
            Err(e) => fail(ui, notices::SIGN_OUT_FAILED, Some(e)),
        }
    }
}
