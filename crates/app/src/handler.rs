//! Protocol handler
//!
//! Turns network operations into scheduler calls and core results into wire
//! replies. Every request gets a correlation id; rejected requests are logged
//! with it and the id travels back to the caller in the error body.

use std::sync::Arc;

use aotd_core::{
    AlbumId, BlockReason, BlockType, DailySelection, Eligibility, Error, Identity, NewOutage,
    Outage, OutageId, Submission, SubmitterId,
};
use aotd_net::{
    ErrorBody, ErrorKind, NetBlockType, NetBlocked, NetCandidate, NetEligibility, NetIdentity,
    NetOutage, NetSelection, NetSubmission, Op, Reply, RequestHandler,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::state::AppState;

pub struct ProtocolHandler {
    state: Arc<AppState>,
}

impl ProtocolHandler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    fn dispatch(&self, identity: Option<Identity>, op: Op, crid: Uuid) -> aotd_core::Result<Reply> {
        let scheduler = &self.state.scheduler;

        match op {
            Op::Ping => Ok(Reply::Pong),

            Op::SelectionChance { submitter_id, date } => {
                let date = date.unwrap_or_else(|| self.state.today());
                let chance = scheduler.selection_chance(&SubmitterId::new(&submitter_id), date)?;
                Ok(Reply::Chance {
                    submitter_id,
                    date,
                    percent: chance * 100.0,
                })
            }

            Op::AlbumOfDay { date } => {
                let date = date.unwrap_or_else(|| self.state.today());
                Ok(match scheduler.get_selection(date)? {
                    Some(selection) => Reply::AlbumOfDay {
                        selection: net_selection(selection),
                    },
                    None => Reply::NotYetSelected { date },
                })
            }

            Op::CreateOutage {
                submitter_id,
                start_date,
                end_date,
                reason,
                imposed_by_admin,
            } => {
                let requester = signed_in(identity)?;
                let request = NewOutage {
                    submitter_id: SubmitterId::new(submitter_id),
                    start_date,
                    end_date,
                    reason,
                    imposed_by_admin,
                };
                let outage = scheduler.create_outage(request, &requester, self.state.today())?;
                Ok(Reply::Outage {
                    outage: net_outage(outage),
                })
            }

            Op::ListOutages { submitter_id } => {
                let filter = submitter_id.map(SubmitterId::new);
                let outages = scheduler.list_outages(filter.as_ref())?;
                Ok(Reply::Outages {
                    outages: outages.into_iter().map(net_outage).collect(),
                })
            }

            Op::DeleteOutage { outage_id } => {
                let requester = signed_in(identity)?;
                let outage = scheduler.delete_outage(OutageId(outage_id), &requester, crid)?;
                Ok(Reply::Outage {
                    outage: net_outage(outage),
                })
            }

            Op::ReplaceSelection {
                date,
                submission_id,
                admin_message,
            } => {
                let requester = signed_in(identity)?;
                let selection = scheduler.override_selection(
                    date,
                    &AlbumId::new(submission_id),
                    admin_message,
                    &requester,
                    crid,
                )?;
                Ok(Reply::Selection {
                    selection: net_selection(selection),
                })
            }

            Op::Eligibility { date } => {
                let requester = signed_in(identity)?;
                let date = date.unwrap_or_else(|| self.state.today());
                let eligibility = scheduler.eligibility(&requester, date)?;
                Ok(Reply::Eligibility {
                    eligibility: net_eligibility(&eligibility),
                })
            }

            Op::SubmitAlbum { album_id, hidden } => {
                let requester = signed_in(identity)?;
                let submission = scheduler.submit_album(&requester, AlbumId::new(album_id), hidden)?;
                Ok(Reply::Submission {
                    submission: net_submission(submission),
                })
            }

            Op::ListSubmissions { include_hidden } => {
                let requester = signed_in(identity)?;
                let submissions = scheduler.list_submissions(&requester, include_hidden)?;
                Ok(Reply::Submissions {
                    submissions: submissions.into_iter().map(net_submission).collect(),
                })
            }

            Op::RemoveSubmission { album_id } => {
                let requester = signed_in(identity)?;
                scheduler.remove_submission(&AlbumId::new(album_id), &requester, crid)?;
                Ok(Reply::Done)
            }

            Op::History { from, to } => {
                let selections = scheduler.selection_history(from, to)?;
                Ok(Reply::History {
                    selections: selections.into_iter().map(net_selection).collect(),
                })
            }
        }
    }
}

impl RequestHandler for ProtocolHandler {
    fn handle(&self, identity: Option<NetIdentity>, op: Op) -> Result<Reply, ErrorBody> {
        let crid = Uuid::new_v4();
        let op_name = op.name();
        let user_id = identity.as_ref().map(|i| i.user_id.clone());
        debug!(%crid, op = op_name, user_id = ?user_id, "Handling request");

        let identity = identity.map(|i| Identity {
            user_id: SubmitterId::new(i.user_id),
            is_admin: i.is_admin,
        });

        self.dispatch(identity, op, crid)
            .map_err(|err| reject(op_name, user_id.as_deref(), crid, err))
    }
}

fn signed_in(identity: Option<Identity>) -> aotd_core::Result<Identity> {
    identity.ok_or_else(|| Error::Forbidden("Sign in to do that".into()))
}

/// Log a failed request and build the body the caller sees
fn reject(op: &str, user_id: Option<&str>, crid: Uuid, err: Error) -> ErrorBody {
    let kind = error_kind(&err);
    let message = match kind {
        ErrorKind::Internal => {
            error!(%crid, op, user_id, error = %err, "Request failed");
            "Internal error".to_string()
        }
        ErrorKind::NoEligibleSubmissions => {
            error!(%crid, op, user_id, error = %err, "Request hit an empty pool");
            err.to_string()
        }
        _ => {
            warn!(%crid, op, user_id, error = %err, "Request rejected");
            err.to_string()
        }
    };
    ErrorBody {
        kind,
        message,
        crid,
    }
}

fn error_kind(err: &Error) -> ErrorKind {
    match err {
        Error::Validation(_) => ErrorKind::Validation,
        Error::Forbidden(_) => ErrorKind::Forbidden,
        Error::NotFound(_) => ErrorKind::NotFound,
        Error::NoEligibleSubmissions { .. } => ErrorKind::NoEligibleSubmissions,
        _ => ErrorKind::Internal,
    }
}

fn net_block_type(block_type: BlockType) -> NetBlockType {
    match block_type {
        BlockType::Outage => NetBlockType::Outage,
        BlockType::AdminOutage => NetBlockType::AdminOutage,
        BlockType::ConsecutiveCap => NetBlockType::ConsecutiveCap,
        BlockType::SelectedToday => NetBlockType::SelectedToday,
    }
}

fn net_selection(selection: DailySelection) -> NetSelection {
    NetSelection {
        date: selection.date,
        submission_id: selection.submission_id.0,
        submitter_id: selection.submitter_id.0,
        manually_selected: selection.manually_selected,
        admin_message: selection.admin_message,
    }
}

fn net_outage(outage: Outage) -> NetOutage {
    let block_type = if outage.imposed_by_admin {
        NetBlockType::AdminOutage
    } else {
        NetBlockType::Outage
    };
    NetOutage {
        id: outage.id.0,
        submitter_id: outage.submitter_id.0,
        start_date: outage.start_date,
        end_date: outage.end_date,
        reason: outage.reason,
        admin_outage: outage.imposed_by_admin,
        block_type,
        created_by: outage.created_by.0,
    }
}

fn net_submission(submission: Submission) -> NetSubmission {
    NetSubmission {
        id: submission.id.0,
        submitter_id: submission.submitter_id.0,
        hidden: submission.hidden,
        submission_date: submission.submission_date,
        last_selected_date: submission.last_selected_date,
        times_selected: submission.times_selected,
    }
}

fn net_blocked(submitter_id: &SubmitterId, reason: &BlockReason) -> NetBlocked {
    NetBlocked {
        submitter_id: submitter_id.to_string(),
        selection_blocked: true,
        block_type: net_block_type(reason.block_type),
        outage_end: reason.outage_end,
        admin_outage: reason.admin_outage,
    }
}

fn net_eligibility(eligibility: &Eligibility) -> NetEligibility {
    let eligible = eligibility
        .submitter_weights
        .iter()
        .map(|(submitter_id, weight)| NetCandidate {
            submitter_id: submitter_id.to_string(),
            percent: weight * 100.0,
            album_ids: eligibility
                .candidates_for(submitter_id)
                .into_iter()
                .map(|s| s.id.to_string())
                .collect(),
        })
        .collect();

    let blocked = eligibility
        .blocked
        .iter()
        .map(|(submitter_id, reason)| net_blocked(submitter_id, reason))
        .collect();

    NetEligibility {
        date: eligibility.date,
        eligible,
        blocked,
    }
}
