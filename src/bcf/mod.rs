//! BCF (BIM Collaboration Format) topics and the `.bcfzip` writer.

mod topic;
mod writer;

pub use topic::{BcfProject, Comment, ModelFile, PerspectiveCamera, Topic, Viewpoint, STATUS_OPEN};
pub use writer::{
    extensions_xml, markup_xml, project_xml, version_xml, viewpoint_xml, write_bcf, write_bcfzip,
    BCF_VERSION, VIEWPOINT_FILE,
};

use crate::analysis::{CheckReport, Issue};
use crate::config::BcfConfig;
use crate::guid::to_ifc_guid;
use crate::model::IfcModel;
use std::path::Path;
use uuid::Uuid;

pub const TOPIC_TYPE_CHECK: &str = "Structural Check";
pub const TOPIC_TYPE_SUMMARY: &str = "Summary";
pub const SUMMARY_TITLE: &str = "Summary: Structural check results";

fn issue_viewpoint(issue: &Issue, config: &BcfConfig) -> Viewpoint {
    let components = match to_ifc_guid(&issue.global_id) {
        Ok(guid) => vec![guid],
        Err(err) => {
            log::warn!(
                element = issue.element_id,
                error = err.to_string();
                "Issue topic has no selectable component"
            );
            Vec::new()
        }
    };

    Viewpoint {
        guid: Uuid::new_v4(),
        components,
        camera: issue
            .bbox
            .map(|bbox| PerspectiveCamera::looking_at(&bbox, config.camera_offset, config.field_of_view)),
    }
}

impl BcfProject {
    /// One topic per issue, in report order, followed by the summary topic.
    #[must_use]
    pub fn from_check(model: &IfcModel, report: &CheckReport, config: &BcfConfig) -> Self {
        let name = config.project_name.clone().unwrap_or_else(|| model.name.clone());
        let mut project = BcfProject::new(name);

        project.file = Some(ModelFile {
            filename: Path::new(&model.file_path)
                .file_name()
                .map_or_else(|| model.file_path.clone(), |f| f.to_string_lossy().to_string()),
            ifc_project: model.project_global_id.clone(),
        });

        for issue in &report.issues {
            project.topics.push(Topic::new(
                issue.title.clone(),
                issue.description.clone(),
                &config.author,
                TOPIC_TYPE_CHECK,
                Some(issue_viewpoint(issue, config)),
            ));
        }

        project.topics.push(Topic::new(
            SUMMARY_TITLE.to_string(),
            report.summary.text(),
            &config.author,
            TOPIC_TYPE_SUMMARY,
            None,
        ));

        project
    }
}
