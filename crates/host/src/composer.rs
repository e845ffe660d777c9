//! Render-ready task view
//!
//! [`ViewComposer::compose`] is a pure function of a [`SessionState`]: every
//! section is derived independently, so a pending or failed read only ever
//! affects its own section.

use alloy_primitives::{Address, U256};
use arbius_bindings::EngineLog;
use arbius_core::{
    cidify, format_ether, format_rate, gateway_url, render_blocktime, Contestation, ContestationVote,
    Lookup, Model, ReadState, Solution, Task,
};
use serde::Serialize;

use crate::config::Config;
use crate::session::SessionState;
use crate::templates::{OutputKind, Template, TemplateRegistry, KANDINSKY2};

/// Link targets for addresses and content identifiers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Links {
    /// Gateway template with a `%C` placeholder
    pub ipfs_gateway: String,
    /// Block explorer base URL
    pub explorer_url: String,
}

impl Links {
    /// Take link targets from configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            ipfs_gateway: config.ipfs_gateway.clone(),
            explorer_url: config.explorer_url.trim_end_matches('/').to_string(),
        }
    }

    fn address(&self, address: &Address) -> String {
        format!("{}/address/{address}", self.explorer_url)
    }

    fn content(&self, cid: &str) -> String {
        gateway_url(&self.ipfs_gateway, cid)
    }
}

/// Outbound link to a validator's page
pub fn validator_link(address: &str) -> String {
    format!("/validator/{address}")
}

/// One labelled value
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Row label
    pub label: &'static str,
    /// Display value
    pub value: String,
    /// Where the value links to, if anywhere
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Field {
    fn plain(label: &'static str, value: impl Into<String>) -> Self {
        Self { label, value: value.into(), link: None }
    }

    fn linked(label: &'static str, value: impl Into<String>, link: String) -> Self {
        Self { label, value: value.into(), link: Some(link) }
    }
}

/// Display state of one record section
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section {
    /// Read still in flight
    Loading,
    /// Read failed; shown inline
    Failed {
        /// Error display string
        message: String,
    },
    /// The record does not exist
    NotFound {
        /// Shown in place of the table
        notice: &'static str,
    },
    /// Full field table
    Found {
        /// Rows in display order
        fields: Vec<Field>,
    },
}

impl Section {
    fn from_read<T>(
        read: &ReadState<Lookup<T>>,
        notice: &'static str,
        fields: impl FnOnce(&T) -> Vec<Field>,
    ) -> Self {
        match read {
            ReadState::Pending => Self::Loading,
            ReadState::Failed(message) => Self::Failed { message: message.clone() },
            ReadState::Ready(Lookup::Absent) => Self::NotFound { notice },
            ReadState::Ready(Lookup::Found(record)) => Self::Found { fields: fields(record) },
        }
    }
}

/// A single vote line
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VoteEntry {
    /// 👍 for yea, 👎 for nay
    pub glyph: &'static str,
    /// Voting validator
    pub address: String,
    /// Indexer timestamp as reported
    pub timestamp: String,
    /// Validator page
    pub link: String,
}

/// Display state of the votes section
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VotesView {
    /// Query still in flight
    Loading,
    /// Indexer or transport failure
    Failed {
        /// Error display string
        message: String,
    },
    /// No votes recorded
    Empty {
        /// Shown in place of the tally
        notice: &'static str,
    },
    /// Counts and one entry per vote
    Tally {
        /// Votes in favour
        yea: usize,
        /// Votes against
        nay: usize,
        /// `"{yea} yea, {nay} nay"`
        summary: String,
        /// Votes in indexer order
        entries: Vec<VoteEntry>,
    },
}

/// Connected account banner
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewerBanner {
    /// Connected account, linked to the block explorer
    pub account: Field,
    /// Present when a token is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Section>,
}

/// A live event seen while the page was open
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventNotice {
    /// Event name
    pub event: &'static str,
    /// Submitting validator
    pub validator: String,
    /// Block the event was mined in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<u64>,
}

/// Everything a renderer needs for the task page
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskView {
    /// `None` while no valid task id is known
    pub task_id: Option<String>,
    /// Present when the page has a connected account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ViewerBanner>,
    /// Solution output files, once a solution with a cid is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_output: Option<SolutionOutput>,
    /// `tasks(id)`
    pub task: Section,
    /// `solutions(id)`
    pub solution: Section,
    /// `contestations(id)`
    pub contestation: Section,
    /// The task's model
    pub model: Section,
    /// Contestation votes
    pub votes: VotesView,
    /// Live engine events, oldest first
    pub events: Vec<EventNotice>,
}

/// Solution output presented through the model's template
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SolutionOutput {
    /// Resolved template name
    pub template: &'static str,
    /// Output directory cid
    pub cid: String,
    /// One entry per template output
    pub files: Vec<OutputFile>,
}

/// A single presentable output file
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    /// How to present the file
    pub kind: OutputKind,
    /// Gateway URL of the file
    pub url: String,
}

/// Derives a [`TaskView`] from session state
#[derive(Debug, Clone, Copy)]
pub struct ViewComposer;

impl ViewComposer {
    /// Compose the view; `now` is unix seconds and only affects relative times
    pub fn compose(
        state: &SessionState,
        links: &Links,
        templates: &TemplateRegistry,
        now: u64,
    ) -> TaskView {
        TaskView {
            task_id: state.task_id.map(|id| id.to_string()),
            viewer: state.account.map(|account| ViewerBanner {
                account: Field::linked("account", account.to_string(), links.address(&account)),
                balance: state.balance.as_ref().map(balance_section),
            }),
            solution_output: solution_output(state, links, templates),
            task: Section::from_read(&state.task, "No task found.", |t| task_fields(t, links, now)),
            solution: Section::from_read(&state.solution, "No solution found.", |s| {
                solution_fields(s, links, now)
            }),
            contestation: Section::from_read(&state.contestation, "No contestation found.", |c| {
                contestation_fields(c, now)
            }),
            model: Section::from_read(&state.model, "No model found.", |m| model_fields(m, links)),
            votes: votes_view(&state.votes),
            events: state.events.iter().map(event_notice).collect(),
        }
    }
}

fn cid_field(cid: &[u8], links: &Links) -> Field {
    let cid = cidify(cid);
    let link = links.content(&cid);
    Field::linked("cid", cid, link)
}

fn task_fields(task: &Task, links: &Links, now: u64) -> Vec<Field> {
    vec![
        Field::plain("model", task.model.to_string()),
        Field::plain("fee", format_ether(task.fee)),
        Field::linked("owner", task.owner.to_string(), links.address(&task.owner)),
        Field::plain("blocktime", render_blocktime(task.blocktime, now)),
        Field::plain("version", task.version.to_string()),
        cid_field(&task.cid, links),
    ]
}

fn solution_fields(solution: &Solution, links: &Links, now: u64) -> Vec<Field> {
    let validator = solution.validator.to_string();
    vec![
        Field::linked("validator", validator.clone(), validator_link(&validator)),
        Field::plain("blocktime", render_blocktime(solution.blocktime, now)),
        Field::plain("claimed", solution.claimed.to_string()),
        cid_field(&solution.cid, links),
    ]
}

fn contestation_fields(contestation: &Contestation, now: u64) -> Vec<Field> {
    let validator = contestation.validator.to_string();
    vec![
        Field::linked("validator", validator.clone(), validator_link(&validator)),
        Field::plain("blocktime", render_blocktime(contestation.blocktime, now)),
        Field::plain("finish_start_index", contestation.finish_start_index.to_string()),
        Field::plain("slashAmount", format_ether(contestation.slash_amount)),
    ]
}

fn model_fields(model: &Model, links: &Links) -> Vec<Field> {
    vec![
        Field::plain("fee", format_ether(model.fee)),
        Field::linked("addr", model.addr.to_string(), links.address(&model.addr)),
        Field::plain("rate", format_rate(model.rate)),
        cid_field(&model.cid, links),
    ]
}

fn solution_output(
    state: &SessionState,
    links: &Links,
    templates: &TemplateRegistry,
) -> Option<SolutionOutput> {
    let solution: &Solution = state.solution.ready()?.found()?;
    if solution.cid.is_empty() {
        return None;
    }
    // until the task is known the default template applies
    let template: &Template = state
        .task
        .ready()
        .and_then(Lookup::found)
        .map_or(&KANDINSKY2, |task| templates.resolve(&task.model));

    let cid = cidify(&solution.cid);
    let base = links.content(&cid);
    Some(SolutionOutput {
        template: template.name,
        files: template
            .outputs
            .iter()
            .map(|output| OutputFile { kind: output.kind, url: format!("{base}/{}", output.filename) })
            .collect(),
        cid,
    })
}

fn balance_section(balance: &ReadState<U256>) -> Section {
    match balance {
        ReadState::Pending => Section::Loading,
        ReadState::Failed(message) => Section::Failed { message: message.clone() },
        ReadState::Ready(wei) => Section::Found { fields: vec![Field::plain("balance", format_ether(*wei))] },
    }
}

fn votes_view(votes: &ReadState<Vec<ContestationVote>>) -> VotesView {
    let votes = match votes {
        ReadState::Pending => return VotesView::Loading,
        ReadState::Failed(message) => return VotesView::Failed { message: message.clone() },
        ReadState::Ready(votes) if votes.is_empty() => return VotesView::Empty { notice: "No votes found." },
        ReadState::Ready(votes) => votes,
    };

    let yea = votes.iter().filter(|v| v.yea).count();
    let nay = votes.len() - yea;
    VotesView::Tally {
        yea,
        nay,
        summary: format!("{yea} yea, {nay} nay"),
        entries: votes
            .iter()
            .map(|v| VoteEntry {
                glyph: if v.yea { "👍" } else { "👎" },
                address: v.address.clone(),
                timestamp: v.timestamp.clone(),
                link: validator_link(&v.address),
            })
            .collect(),
    }
}

fn event_notice(log: &EngineLog) -> EventNotice {
    EventNotice { event: log.event.name(), validator: log.validator.to_string(), block: log.block_number }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{sample_contestation, sample_model, sample_solution, sample_task, vote};
    use crate::templates::ZEROSCOPEV2;
    use alloy_primitives::B256;
    use arbius_core::TaskId;

    const NOW: u64 = 1_700_000_300;

    fn links() -> Links {
        Links::from_config(&Config {
            ipfs_gateway: "https://gateway.example/ipfs/%C".to_string(),
            explorer_url: "https://nova.arbiscan.io/".to_string(),
            ..Config::default()
        })
    }

    fn loaded() -> SessionState {
        SessionState {
            generation: 1,
            task_id: Some(TaskId(B256::repeat_byte(0x0a))),
            task: ReadState::Ready(Lookup::Found(sample_task())),
            solution: ReadState::Ready(Lookup::Found(sample_solution())),
            contestation: ReadState::Ready(Lookup::Found(sample_contestation())),
            model: ReadState::Ready(Lookup::Found(sample_model())),
            votes: ReadState::Ready(vec![vote("1", true), vote("2", true), vote("3", false)]),
            ..Default::default()
        }
    }

    fn compose(state: &SessionState) -> TaskView {
        ViewComposer::compose(state, &links(), &TemplateRegistry::default(), NOW)
    }

    fn field<'a>(section: &'a Section, label: &str) -> &'a Field {
        match section {
            Section::Found { fields } => fields.iter().find(|f| f.label == label).unwrap(),
            other => panic!("section not found: {other:?}"),
        }
    }

    #[test]
    fn test_task_fields() {
        let view = compose(&loaded());

        assert_eq!(field(&view.task, "fee").value, "1.0");
        assert_eq!(field(&view.task, "version").value, "0");
        let owner = field(&view.task, "owner");
        assert_eq!(
            owner.link.as_deref(),
            Some(format!("https://nova.arbiscan.io/address/{}", sample_task().owner).as_str())
        );
        let cid = field(&view.task, "cid");
        assert_eq!(cid.value, "QmaozNR7DZHQK1ZcU9p7QdrshMvXqWK6gpu5rmrkPdT3L4");
        assert_eq!(
            cid.link.as_deref(),
            Some("https://gateway.example/ipfs/QmaozNR7DZHQK1ZcU9p7QdrshMvXqWK6gpu5rmrkPdT3L4")
        );
        assert!(field(&view.task, "blocktime").value.starts_with("2023-11-14 22:13:20 UTC"));
    }

    #[test]
    fn test_validator_links() {
        let view = compose(&loaded());
        let validator = field(&view.solution, "validator");
        assert_eq!(validator.link, Some(format!("/validator/{}", sample_solution().validator)));
        assert_eq!(field(&view.contestation, "slashAmount").value, "0.5");
        assert_eq!(field(&view.model, "rate").value, "1.0x");
        assert_eq!(field(&view.contestation, "finish_start_index").value, "2");
        assert!(view.solution_output.is_some());
    }

    #[test]
    fn test_output_uses_registered_template() {
        let mut templates = TemplateRegistry::default();
        templates.register(sample_task().model, &ZEROSCOPEV2);
        let view = ViewComposer::compose(&loaded(), &links(), &templates, NOW);

        let output = view.solution_output.unwrap();
        let cid = cidify(&sample_solution().cid);
        assert_eq!(output.template, "Zeroscopev2");
        assert_eq!(
            output.files,
            vec![OutputFile {
                kind: OutputKind::Video,
                url: format!("https://gateway.example/ipfs/{cid}/out-1.mp4"),
            }]
        );
        assert_eq!(output.cid, cid);
    }

    #[test]
    fn test_output_defaults_for_unknown_model() {
        let mut templates = TemplateRegistry::default();
        templates.register(B256::repeat_byte(0x77), &ZEROSCOPEV2);
        let view = ViewComposer::compose(&loaded(), &links(), &templates, NOW);

        let output = view.solution_output.unwrap();
        assert_eq!(output.template, "Kandinsky2");
        assert_eq!(output.files.len(), 1);
        assert_eq!(output.files[0].kind, OutputKind::Image);
        assert!(output.files[0].url.ends_with("/out-1.png"));
    }

    #[test]
    fn test_output_defaults_while_task_pending() {
        let mut templates = TemplateRegistry::default();
        templates.register(sample_task().model, &ZEROSCOPEV2);
        let state = SessionState { task: ReadState::Pending, ..loaded() };
        let view = ViewComposer::compose(&state, &links(), &templates, NOW);

        assert_eq!(view.solution_output.unwrap().template, "Kandinsky2");
    }

    #[test]
    fn test_vote_tally() {
        let view = compose(&loaded());
        let VotesView::Tally { yea, nay, summary, entries } = view.votes else {
            panic!("expected tally");
        };
        assert_eq!((yea, nay), (2, 1));
        assert_eq!(summary, "2 yea, 1 nay");
        assert_eq!(entries[0].glyph, "👍");
        assert_eq!(entries[2].glyph, "👎");
        assert_eq!(entries[2].link, format!("/validator/{}", entries[2].address));
    }

    #[test]
    fn test_absent_records_render_notices() {
        let state = SessionState {
            task: ReadState::Ready(Lookup::Absent),
            solution: ReadState::Ready(Lookup::Absent),
            contestation: ReadState::Ready(Lookup::Absent),
            model: ReadState::Ready(Lookup::Absent),
            votes: ReadState::Ready(Vec::new()),
            ..loaded()
        };
        let view = compose(&state);

        assert_eq!(view.task, Section::NotFound { notice: "No task found." });
        assert_eq!(view.solution, Section::NotFound { notice: "No solution found." });
        assert_eq!(view.contestation, Section::NotFound { notice: "No contestation found." });
        assert_eq!(view.model, Section::NotFound { notice: "No model found." });
        assert_eq!(view.votes, VotesView::Empty { notice: "No votes found." });
        assert_eq!(view.solution_output, None);
    }

    #[test]
    fn test_failed_votes_do_not_affect_records() {
        let state = SessionState { votes: ReadState::Failed("indexer error: down".to_string()), ..loaded() };
        let view = compose(&state);

        assert_eq!(view.votes, VotesView::Failed { message: "indexer error: down".to_string() });
        assert!(matches!(view.task, Section::Found { .. }));
        assert!(matches!(view.solution, Section::Found { .. }));
        assert!(matches!(view.contestation, Section::Found { .. }));
        assert!(matches!(view.model, Section::Found { .. }));
    }

    #[test]
    fn test_empty_state_is_all_loading() {
        let view = compose(&SessionState::default());
        assert_eq!(view.task_id, None);
        assert_eq!(view.task, Section::Loading);
        assert_eq!(view.model, Section::Loading);
        assert_eq!(view.votes, VotesView::Loading);
        assert!(view.viewer.is_none());
    }

    #[test]
    fn test_viewer_banner() {
        let account = Address::repeat_byte(0x55);
        let state = SessionState {
            account: Some(account),
            balance: Some(ReadState::Ready(U256::from(2_500_000_000_000_000_000u64))),
            ..loaded()
        };
        let banner = compose(&state).viewer.unwrap();
        assert_eq!(banner.account.value, account.to_string());
        assert_eq!(field(banner.balance.as_ref().unwrap(), "balance").value, "2.5");
    }
}
