//! Graph state controller.
//!
//! All transitions go through [`reduce`], a pure `(state, action) -> state`
//! function. [`GraphExplorer`] wraps it with the callbacks a rendering layer
//! calls and keeps the transient hover focus, which never touches the model.
//!
//! ```text
//! Empty --Import--> Loaded --SetFilters--> Filtered <--> Expanded <--> Highlighted
//!   any --Reset--> Loaded          any --Import--> Loaded
//! ```

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::data_loader::RawDataset;
use crate::degree::{compute_degrees, DegreeTable};
use crate::errors::{GraphError, GraphResult};
use crate::filter::{self, Filters};
use crate::graph::GraphModel;
use crate::mapping::ColumnMapping;
use crate::normalize::{normalize, CanonicalData, CanonicalEdge};
use crate::style::{build_accessors, LegendDescription, StyleAccessors};
use crate::timeline::{self, TimelineBin};
use crate::transform::transform;

/// Record count above which an import has to be acknowledged.
pub const SCALE_WARNING_THRESHOLD: usize = 300;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Loaded,
    Filtered,
    Expanded,
    Highlighted,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ScaleWarning {
    pub nodes: usize,
    pub edges: usize,
    pub threshold: usize,
}

impl ScaleWarning {
    /// A warning when either table is over the threshold.
    pub fn check(dataset: &RawDataset) -> Option<Self> {
        let (nodes, edges) = (dataset.nodes.len(), dataset.edges.len());
        if nodes > SCALE_WARNING_THRESHOLD || edges > SCALE_WARNING_THRESHOLD {
            Some(Self {
                nodes,
                edges,
                threshold: SCALE_WARNING_THRESHOLD,
            })
        } else {
            None
        }
    }

    pub fn message(&self) -> String {
        format!(
            "Dataset has {} nodes and {} edges (more than {}); rendering may be slow",
            self.nodes, self.edges, self.threshold
        )
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    /// Hour bucket labels selected on the timeline, in order.
    pub brushed_dates: Vec<String>,
}

impl Highlight {
    pub fn is_active(&self) -> bool {
        !self.brushed_dates.is_empty()
    }
}

/// Rendered element ids split by a brushed time window.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HighlightPartition {
    pub nodes_in: Vec<String>,
    pub nodes_out: Vec<String>,
    pub edges_in: Vec<String>,
    pub edges_out: Vec<String>,
}

/// Rendered element ids split around a hovered node.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HoverFocus {
    pub node: String,
    pub focus_nodes: Vec<String>,
    pub focus_edges: Vec<String>,
    pub dimmed_nodes: Vec<String>,
    pub dimmed_edges: Vec<String>,
}

/// Everything derived once per import from the full dataset.
#[derive(Debug, PartialEq)]
pub struct Session {
    pub data: CanonicalData,
    pub degrees: DegreeTable,
    pub accessors: StyleAccessors,
    pub legend: LegendDescription,
}

impl Session {
    pub fn build(dataset: &RawDataset, mapping: &ColumnMapping) -> GraphResult<Self> {
        let data = normalize(dataset, mapping)?;
        let degrees = compute_degrees(&data.edges);
        let accessors = build_accessors(&data);
        let legend = accessors.legend(&data);
        Ok(Self {
            data,
            degrees,
            accessors,
            legend,
        })
    }

    pub fn render(&self, edges: &[CanonicalEdge]) -> GraphResult<GraphModel> {
        transform(
            edges,
            &self.data.nodes,
            &self.degrees,
            &self.accessors,
            &self.data.mapping,
        )
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Import {
        dataset: RawDataset,
        mapping: ColumnMapping,
        acknowledge_large: bool,
    },
    SetFilters(Filters),
    SelectNode(String),
    SetHighlight(Highlight),
    Reset,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Import { .. } => "import",
            Action::SetFilters(_) => "set filters",
            Action::SelectNode(_) => "select node",
            Action::SetHighlight(_) => "set highlight",
            Action::Reset => "reset",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphState {
    pub session: Option<Arc<Session>>,
    pub filters: Filters,
    /// Whether filters were submitted since the last import or reset.
    pub filtered: bool,
    pub highlight: Highlight,
    pub selection: Option<String>,
    /// Canonical edges currently backing the rendered model.
    pub visible_edges: Vec<CanonicalEdge>,
    pub graph: GraphModel,
    pub scale_warning: Option<ScaleWarning>,
}

impl GraphState {
    pub fn phase(&self) -> Phase {
        if self.session.is_none() {
            Phase::Empty
        } else if self.highlight.is_active() {
            Phase::Highlighted
        } else if self.selection.is_some() {
            Phase::Expanded
        } else if self.filtered {
            Phase::Filtered
        } else {
            Phase::Loaded
        }
    }

    pub fn legend(&self) -> Option<&LegendDescription> {
        self.session.as_ref().map(|s| &s.legend)
    }

    fn session(&self, action: &str) -> GraphResult<Arc<Session>> {
        self.session.clone().ok_or_else(|| {
            GraphError::InvalidState(format!("cannot {} before a dataset is imported", action))
        })
    }

    /// Split the rendered model by the brushed dates: edges whose bucket is
    /// brushed and their endpoints are in, the rest is out.
    pub fn highlight_partition(&self) -> Option<HighlightPartition> {
        if !self.highlight.is_active() {
            return None;
        }

        let brushed: HashSet<&str> = self.highlight.brushed_dates.iter().map(String::as_str).collect();
        let mut partition = HighlightPartition::default();
        let mut lit_nodes: HashSet<&str> = HashSet::new();

        for edge in &self.graph.edges {
            let inside = edge
                .data
                .date
                .as_deref()
                .is_some_and(|date| brushed.contains(date));
            if inside {
                lit_nodes.insert(edge.source.as_str());
                lit_nodes.insert(edge.target.as_str());
                partition.edges_in.push(edge.id.clone());
            } else {
                partition.edges_out.push(edge.id.clone());
            }
        }
        for node in &self.graph.nodes {
            if lit_nodes.contains(node.id.as_str()) {
                partition.nodes_in.push(node.id.clone());
            } else {
                partition.nodes_out.push(node.id.clone());
            }
        }
        Some(partition)
    }

    /// The hovered node with its neighbours and incident edges. Nothing is
    /// focused while a brush is active or when the node is not rendered.
    pub fn hover_focus(&self, id: &str) -> Option<HoverFocus> {
        if self.highlight.is_active() {
            return None;
        }
        self.graph.get_node_by_id(id)?;

        let mut neighbours: IndexSet<&str> = IndexSet::new();
        neighbours.insert(id);
        let mut focus = HoverFocus {
            node: id.to_string(),
            ..Default::default()
        };

        for edge in &self.graph.edges {
            if edge.source == id || edge.target == id {
                neighbours.insert(edge.source.as_str());
                neighbours.insert(edge.target.as_str());
                focus.focus_edges.push(edge.id.clone());
            } else {
                focus.dimmed_edges.push(edge.id.clone());
            }
        }
        for node in &self.graph.nodes {
            if neighbours.contains(node.id.as_str()) {
                focus.focus_nodes.push(node.id.clone());
            } else {
                focus.dimmed_nodes.push(node.id.clone());
            }
        }
        Some(focus)
    }

    /// Ids of rendered nodes whose type is one of the checked legend entries.
    pub fn legend_toggle<S: AsRef<str>>(&self, checked: &[S]) -> Vec<String> {
        let checked: HashSet<&str> = checked.iter().map(|c| c.as_ref()).collect();
        self.graph
            .nodes
            .iter()
            .filter(|n| checked.contains(n.data.node_type.as_str()))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Hourly edge counts of the visible edges.
    pub fn timeline(&self) -> Vec<TimelineBin> {
        timeline::histogram(&self.visible_edges)
    }
}

/// Apply `action` to `state`, returning the next state. `state` is never
/// modified; on error the caller keeps it as is.
pub fn reduce(state: &GraphState, action: Action) -> GraphResult<GraphState> {
    let name = action.name();
    debug!("Reducing {} in phase {:?}", name, state.phase());

    let next = match action {
        Action::Import {
            dataset,
            mapping,
            acknowledge_large,
        } => {
            mapping.validate()?;
            if let Some(warning) = ScaleWarning::check(&dataset) {
                if !acknowledge_large {
                    warn!("{}", warning.message());
                    return Ok(GraphState {
                        scale_warning: Some(warning),
                        ..state.clone()
                    });
                }
                info!("Large dataset acknowledged: {}", warning.message());
            }

            let session = Session::build(&dataset, &mapping)?;
            info!("Imported dataset: {}", dataset.stats());
            loaded(Arc::new(session))?
        }
        Action::Reset => match &state.session {
            Some(session) => loaded(session.clone())?,
            None => GraphState::default(),
        },
        Action::SetFilters(filters) => {
            let session = state.session(name)?;
            let visible_edges = filter::filter_by_entity_and_date(&session.data.edges, &filters)?;
            let graph = session.render(&visible_edges)?;
            GraphState {
                session: Some(session),
                filters,
                filtered: true,
                highlight: Highlight::default(),
                selection: None,
                visible_edges,
                graph,
                scale_warning: None,
            }
        }
        Action::SelectNode(id) => {
            let session = state.session(name)?;
            let expansion =
                filter::incident_edges(&session.data.edges, &id, state.filters.date_range.as_ref());
            let fragment = session.render(&expansion)?;
            let graph = state.graph.merge(&fragment);

            let mut visible_edges = state.visible_edges.clone();
            let known: HashSet<usize> = visible_edges.iter().map(|e| e.index).collect();
            visible_edges.extend(expansion.into_iter().filter(|e| !known.contains(&e.index)));

            GraphState {
                selection: Some(id),
                visible_edges,
                graph,
                ..state.clone()
            }
        }
        Action::SetHighlight(highlight) => {
            state.session(name)?;
            GraphState {
                highlight,
                ..state.clone()
            }
        }
    };

    debug!("Now in phase {:?}: {}", next.phase(), next.graph.stats());
    Ok(next)
}

/// Default filters over the full dataset.
fn loaded(session: Arc<Session>) -> GraphResult<GraphState> {
    let visible_edges = session.data.edges.clone();
    let graph = session.render(&visible_edges)?;
    Ok(GraphState {
        session: Some(session),
        visible_edges,
        graph,
        ..Default::default()
    })
}

/// Controller used by a rendering layer: it owns the state and maps UI
/// callbacks to reducer actions.
#[derive(Debug, Default)]
pub struct GraphExplorer {
    state: GraphState,
    hover: Option<HoverFocus>,
}

impl GraphExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn graph(&self) -> &GraphModel {
        &self.state.graph
    }

    pub fn legend(&self) -> Option<&LegendDescription> {
        self.state.legend()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn hover(&self) -> Option<&HoverFocus> {
        self.hover.as_ref()
    }

    pub fn dispatch(&mut self, action: Action) -> GraphResult<()> {
        self.state = reduce(&self.state, action)?;
        Ok(())
    }

    /// Import a dataset. Returns the scale warning when the import was held
    /// back for lack of acknowledgement.
    pub fn import(
        &mut self,
        dataset: RawDataset,
        mapping: ColumnMapping,
        acknowledge_large: bool,
    ) -> GraphResult<Option<ScaleWarning>> {
        self.dispatch(Action::Import {
            dataset,
            mapping,
            acknowledge_large,
        })?;
        self.hover = None;
        Ok(self.state.scale_warning.clone())
    }

    pub fn on_form_submit(&mut self, filters: Filters) -> GraphResult<()> {
        self.hover = None;
        self.dispatch(Action::SetFilters(filters))
    }

    pub fn on_node_click(&mut self, id: &str) -> GraphResult<()> {
        self.dispatch(Action::SelectNode(id.to_string()))
    }

    pub fn on_node_hover(&mut self, id: &str) -> Option<&HoverFocus> {
        self.hover = self.state.hover_focus(id);
        self.hover.as_ref()
    }

    pub fn on_hover_end(&mut self) {
        self.hover = None;
    }

    pub fn on_brush_select(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> GraphResult<()> {
        self.hover = None;
        self.dispatch(Action::SetHighlight(Highlight {
            brushed_dates: timeline::brush_buckets(start, end),
        }))
    }

    pub fn on_brush_clear(&mut self) -> GraphResult<()> {
        self.dispatch(Action::SetHighlight(Highlight::default()))
    }

    pub fn on_reset(&mut self) -> GraphResult<()> {
        self.hover = None;
        self.dispatch(Action::Reset)
    }

    pub fn on_legend_toggle<S: AsRef<str>>(&self, checked: &[S]) -> Vec<String> {
        self.state.legend_toggle(checked)
    }

    pub fn highlight_partition(&self) -> Option<HighlightPartition> {
        self.state.highlight_partition()
    }

    pub fn timeline(&self) -> Vec<TimelineBin> {
        self.state.timeline()
    }
}
