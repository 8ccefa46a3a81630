//! Message copy and keyboards

use crate::commands::{AdminFlow, Button};
use crate::models::{Half, ReportHalf, ReportRef, Role, User};
use crate::policy::SubmissionRejection;
use crate::services::{Analysis, Keyboard};
use crate::utils::helpers::{format_overdue, format_report_date, truncate_text};

pub const ASK_FULL_NAME: &str =
    "Welcome to ReportBuddy! Please send your full name, e.g. \"Ivan Petrov\".";
pub const INVALID_FULL_NAME: &str =
    "That does not look like a full name. Send two to four words, letters only.";
pub const ASK_POSITION: &str = "Thanks! Now send your position.";
pub const INVALID_POSITION: &str = "Position must not be empty.";
pub const CANCELLED: &str = "Cancelled.";
pub const ALREADY_HANDLED: &str = "This report was already submitted or handled.";
pub const REPORT_GONE: &str = "This report no longer exists.";
pub const ALREADY_APPROVED: &str = "This report was already approved.";
pub const ASK_COMMENT: &str = "Send your comment for the author.";
pub const ASK_REJECT_COMMENT: &str =
    "Send the reason for rejection. The report half will be removed.";
pub const ASK_ANSWER: &str = "Send your answer to the reviewer.";
pub const COMMENT_SENT: &str = "Comment sent.";
pub const ANSWER_SENT: &str = "Answer sent.";
pub const UNKNOWN_USER: &str = "This user has not registered with the bot. Pick another user.";
pub const CANNOT_TARGET_SELF: &str = "You cannot apply this action to yourself.";
pub const CHAT_NOT_REGISTERED: &str =
    "This chat is not registered. Add the bot to the group and send /register_chat there.";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong, please try again.";
pub const BUSY: &str = "The bot is busy right now, please try again in a minute.";
pub const NO_USERS: &str = "No users yet.";
pub const CANCEL_HINT: &str = "Press the button below to cancel.";

const ANALYZER_UNAVAILABLE: &str =
    "Report analysis is temporarily unavailable. \
     You can send the report as is or cancel and try later.";

pub fn cancel_keyboard() -> Keyboard {
    Keyboard::Inline(vec![vec![("Cancel".to_string(), Button::Cancel)]])
}

fn confirm_keyboard() -> Keyboard {
    Keyboard::Inline(vec![
        vec![("Send report".to_string(), Button::ConfirmReport)],
        vec![("Cancel".to_string(), Button::Cancel)],
    ])
}

fn manual_keyboard() -> Keyboard {
    Keyboard::Inline(vec![
        vec![("Send anyway".to_string(), Button::ForceSend)],
        vec![("Cancel".to_string(), Button::Cancel)],
    ])
}

pub fn review_keyboard(report: ReportRef, approved: bool) -> Keyboard {
    let mut rows = Vec::new();
    if !approved {
        rows.push(vec![("Approve".to_string(), Button::Approve(report))]);
    }
    rows.push(vec![
        ("Reject".to_string(), Button::Reject(report)),
        ("Comment".to_string(), Button::Comment(report)),
    ]);
    Keyboard::Inline(rows)
}

pub fn comment_keyboard(report: ReportRef) -> Keyboard {
    Keyboard::Inline(vec![vec![("Reply".to_string(), Button::Comment(report))]])
}

pub fn answer_keyboard(reviewer_id: i64, report: ReportRef) -> Keyboard {
    Keyboard::Inline(vec![vec![("Answer".to_string(), Button::Answer { reviewer_id, report })]])
}

pub fn greeting(user: &User) -> String {
    match user.role {
        Role::Admin | Role::TeleAdmin => format!(
            "Hello, {}! Admin commands: /add_examiner, /remove_examiner, /assign_admin, \
             /assign_tele_admin, /demote_admin, /block_user, /unblock_user, /set_working_chat, \
             /edit_name, /edit_position, /list_users. \
             Send /register_chat in a group to use it as a working chat.",
            user.display_name()
        ),
        _ => format!(
            "Hello, {}! Send your morning plan and your evening results here as plain text.",
            user.display_name()
        ),
    }
}

pub fn registered(user: &User) -> String {
    format!("Registration complete.\n\n{}", greeting(user))
}

pub fn rejection(rejection: SubmissionRejection) -> String {
    match rejection {
        SubmissionRejection::OutsideWindow => {
            "Reports are accepted during the morning and evening windows only.".to_string()
        }
        SubmissionRejection::NotOpenYet => "The morning window has not opened yet.".to_string(),
        SubmissionRejection::WaitForEvening => {
            "Your morning report is in. \
             The evening report is accepted once the evening window opens."
                .to_string()
        }
        SubmissionRejection::MorningRequired => {
            "Submit the morning report before the evening one.".to_string()
        }
        SubmissionRejection::AlreadySubmitted(half) => {
            format!("Your {} report for today is already submitted.", half.as_str())
        }
    }
}

/// Reply to a scored draft and the keyboard that goes with it
pub fn scored(analysis: &Analysis, min_score: u8) -> (String, Keyboard) {
    let mut text = format!("Report score: {}/10.", analysis.score);
    if !analysis.recommendations.is_empty() {
        text.push_str("\n\nRecommendations:");
        for recommendation in &analysis.recommendations {
            text.push_str("\n- ");
            text.push_str(recommendation);
        }
    }
    if analysis.score >= min_score {
        text.push_str("\n\nSend the report?");
        (text, confirm_keyboard())
    } else {
        text.push_str("\n\nThe score is low. Cancel and rewrite the report, or send it anyway.");
        (text, manual_keyboard())
    }
}

pub fn analyzer_unavailable() -> (String, Keyboard) {
    (ANALYZER_UNAVAILABLE.to_string(), manual_keyboard())
}

/// The analyzed path is closed right now but a late submission is possible
pub fn manual_only(reason: SubmissionRejection) -> (String, Keyboard) {
    (
        format!("{}\n\nYou can still send it now; it will be recorded as late.", rejection(reason)),
        manual_keyboard(),
    )
}

pub fn low_score_confirm() -> (String, Keyboard) {
    (
        "The score is below the threshold. Use \"Send anyway\" or cancel.".to_string(),
        manual_keyboard(),
    )
}

pub fn submitted(half: Half, report_half: &ReportHalf) -> String {
    match report_half.overdue() {
        Some(overdue) => format!(
            "Your {} report is recorded as late by {}.",
            half.as_str(),
            format_overdue(overdue)
        ),
        None => format!("Your {} report is submitted. Thank you!", half.as_str()),
    }
}

pub fn review_notification(author: &User, report: ReportRef, half: &ReportHalf) -> String {
    let mut text = format!(
        "{} report from {} ({}) for {}",
        capitalize(report.half.as_str()),
        author.display_name(),
        author.position.as_deref().unwrap_or("-"),
        format_report_date(report.date)
    );
    if let Some(overdue) = half.overdue() {
        text.push_str(&format!(", late by {}", format_overdue(overdue)));
    }
    if half.is_approved_by_system() {
        text.push_str(", approved automatically");
    }
    text.push_str(":\n\n");
    text.push_str(&half.data);
    text
}

pub fn approved_for_author(report: ReportRef, reviewer: &User) -> String {
    format!(
        "Your {} report for {} was approved by {}.",
        report.half.as_str(),
        format_report_date(report.date),
        reviewer.display_name()
    )
}

pub fn approved_for_reviewer(author: &User, report: ReportRef) -> String {
    format!("Approved the {} report of {}.", report.half.as_str(), author.display_name())
}

pub fn rejected_for_author(report: ReportRef, reviewer: &User, comment: &str) -> String {
    format!(
        "Your {} report for {} was rejected by {}:\n\n{}\n\nPlease submit it again.",
        report.half.as_str(),
        format_report_date(report.date),
        reviewer.display_name(),
        comment
    )
}

pub fn rejected_for_reviewer(report: ReportRef) -> String {
    format!("The {} report was rejected and removed.", report.half.as_str())
}

pub fn comment_for_author(report: ReportRef, reviewer: &User, comment: &str) -> String {
    format!(
        "{} commented on your {} report for {}:\n\n{}",
        reviewer.display_name(),
        report.half.as_str(),
        format_report_date(report.date),
        comment
    )
}

pub fn answer_for_reviewer(report: ReportRef, author: &User, answer: &str) -> String {
    format!(
        "{} answered about the {} report for {}:\n\n{}",
        author.display_name(),
        report.half.as_str(),
        format_report_date(report.date),
        answer
    )
}

pub fn flow_prompt(flow: AdminFlow) -> (String, Keyboard) {
    let (text, label) = match flow {
        AdminFlow::AddExaminer => ("Pick the user to make an examiner.", "Pick user"),
        AdminFlow::RemoveExaminer => ("Pick the examiner to remove.", "Pick user"),
        AdminFlow::AssignAdmin => ("Pick the user to make an admin.", "Pick user"),
        AdminFlow::AssignTeleAdmin => ("Pick the user to make a tele-admin.", "Pick user"),
        AdminFlow::DemoteAdmin => ("Pick the admin to demote.", "Pick user"),
        AdminFlow::BlockUser => ("Pick the user to block.", "Pick user"),
        AdminFlow::UnblockUser => ("Pick the user to unblock.", "Pick user"),
        AdminFlow::SetWorkingChat => {
            return (
                "Pick the working chat, or send its id.".to_string(),
                Keyboard::PickChat("Pick chat".to_string()),
            )
        }
        AdminFlow::EditName => ("Pick the user whose name to edit.", "Pick user"),
        AdminFlow::EditPosition => ("Pick the user whose position to edit.", "Pick user"),
    };
    (
        format!("{} You can also send the user id.", text),
        Keyboard::PickUser(label.to_string()),
    )
}

pub fn pick_user_for_chat(chat_title: Option<&str>) -> (String, Keyboard) {
    (
        format!(
            "Chat \"{}\" selected. Now pick the user to assign to it.",
            chat_title.unwrap_or("untitled")
        ),
        Keyboard::PickUser("Pick user".to_string()),
    )
}

pub fn ask_edited_text(flow: AdminFlow, target: &User) -> String {
    match flow {
        AdminFlow::EditPosition => format!("Send the new position for {}.", target.display_name()),
        _ => format!("Send the new full name for {}.", target.display_name()),
    }
}

pub fn admin_done(flow: AdminFlow, target: &User) -> String {
    let what = match flow {
        AdminFlow::AddExaminer => "is now an examiner",
        AdminFlow::RemoveExaminer => "is no longer an examiner",
        AdminFlow::AssignAdmin => "is now an admin",
        AdminFlow::AssignTeleAdmin => "is now a tele-admin",
        AdminFlow::DemoteAdmin => "is no longer an admin",
        AdminFlow::BlockUser => "is blocked",
        AdminFlow::UnblockUser => "is unblocked",
        AdminFlow::SetWorkingChat => "is assigned to the working chat",
        AdminFlow::EditName => "has a new name",
        AdminFlow::EditPosition => "has a new position",
    };
    format!("Done: {} {}.", target.display_name(), what)
}

/// Note for the target of an admin action, if they should be told
pub fn admin_notice(flow: AdminFlow) -> Option<&'static str> {
    match flow {
        AdminFlow::AddExaminer => Some("You can now review reports."),
        AdminFlow::RemoveExaminer => Some("You no longer review reports."),
        AdminFlow::AssignAdmin | AdminFlow::AssignTeleAdmin => {
            Some("You are now an admin. Send /start to see the commands.")
        }
        AdminFlow::DemoteAdmin => Some("You are no longer an admin."),
        AdminFlow::UnblockUser => Some("Your access to the bot has been restored."),
        AdminFlow::BlockUser
        | AdminFlow::SetWorkingChat
        | AdminFlow::EditName
        | AdminFlow::EditPosition => None,
    }
}

pub fn not_applicable(flow: AdminFlow, target: &User) -> String {
    match flow {
        AdminFlow::DemoteAdmin => format!("{} is not an admin.", target.display_name()),
        AdminFlow::UnblockUser => format!("{} is not blocked.", target.display_name()),
        _ => format!("{} is blocked; unblock them first.", target.display_name()),
    }
}

pub fn working_chat_registered(title: Option<&str>) -> String {
    format!("Chat \"{}\" is registered as a working chat.", title.unwrap_or("untitled"))
}

pub fn user_line(user: &User) -> String {
    let mut line = format!(
        "{} - {} [{}] id {}",
        truncate_text(&user.display_name(), 40),
        user.position.as_deref().unwrap_or("-"),
        role_label(user.role),
        user.id
    );
    if user.is_examiner {
        line.push_str(", examiner");
    }
    if let Some(chat_id) = user.working_chat_id {
        line.push_str(&format!(", chat {}", chat_id));
    }
    line
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Employee => "employee",
        Role::Admin => "admin",
        Role::TeleAdmin => "tele-admin",
        Role::Blocked => "blocked",
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
