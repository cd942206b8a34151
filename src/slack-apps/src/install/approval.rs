//! Admin approval requests for installs on workspaces that require them.

use slack_api::{APPROVAL_ALTERNATIVE, ApprovalReason, ApprovalRequest, DeveloperInstallRequest};
use slack_protocol::{InstallState, SlackResult};
use tracing::debug;

use crate::clients::Clients;

const AUTO_REQUEST_REASON: &str =
    "This request has been automatically generated according to project environment settings.";

/// Sends, cancels or skips an approval request and reports the state the
/// install ends in.
pub(super) async fn handle_approval(
    clients: &Clients,
    token: &str,
    install: &DeveloperInstallRequest,
    reason: ApprovalReason,
    team_id: String,
    auto_request: bool,
) -> SlackResult<InstallState> {
    match reason {
        ApprovalReason::Eligible => request_approval(clients, token, install, team_id, auto_request).await,
        ApprovalReason::Pending => {
            clients.io.print_info(&format!(
                "\nThis app has requested admin approval to install and is awaiting review\n   {APPROVAL_ALTERNATIVE}"
            ));
            let cancel = clients.io.is_tty()
                && clients
                    .io
                    .confirm("Cancel the current request to install this app?", false)?;
            if !cancel {
                return Ok(InstallState::RequestPending);
            }

            clients.api.cancel_app_approval(token, &install.app_id).await?;
            debug!(app_id = %install.app_id, "Cancelled approval request");
            let state = request_approval(clients, token, install, team_id, auto_request).await?;
            if state == InstallState::RequestPending {
                Ok(state)
            } else {
                Ok(InstallState::RequestCancelled)
            }
        }
    }
}

async fn request_approval(
    clients: &Clients,
    token: &str,
    install: &DeveloperInstallRequest,
    team_id: String,
    auto_request: bool,
) -> SlackResult<InstallState> {
    clients.io.print_info(&format!(
        "\nAdministrator approval is required to install this app\n   {APPROVAL_ALTERNATIVE}"
    ));

    let reason = if auto_request {
        AUTO_REQUEST_REASON.to_string()
    } else {
        if !clients.io.is_tty()
            || !clients
                .io
                .confirm("Request approval to install this app?", true)?
        {
            return Ok(InstallState::RequestNotSent);
        }
        clients.io.input("Enter a reason for installing this app:", "")?
    };

    let request = ApprovalRequest {
        app_id: install.app_id.clone(),
        scopes: install.bot_scopes.join(","),
        reason,
        domains: install.outgoing_domains.clone(),
        team_id,
    };
    let request_id = clients.api.request_app_approval(token, &request).await?;
    debug!(app_id = %request.app_id, request_id = %request_id, "Sent approval request");
    Ok(InstallState::RequestPending)
}
