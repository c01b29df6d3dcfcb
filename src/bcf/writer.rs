//! BCF 3.0 archive serialisation.
//!
//! Layout of a `.bcfzip`:
//!
//! ```text
//! bcf.version
//! project.bcfp
//! extensions.xml
//! <topic guid>/markup.bcf
//! <topic guid>/viewpoint.bcfv     (topics with a viewpoint only)
//! ```

use super::topic::{BcfProject, Comment, PerspectiveCamera, Topic, Viewpoint};
use crate::error::BcfError;
use chrono::{DateTime, SecondsFormat, Utc};
use nalgebra::{Point3, Vector3};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const BCF_VERSION: &str = "3.0";
pub const VIEWPOINT_FILE: &str = "viewpoint.bcfv";

fn xml_error(err: impl std::fmt::Display) -> BcfError {
    BcfError::Xml {
        message: err.to_string(),
    }
}

fn timestamp(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Thin layer over `quick_xml::Writer` for the handful of shapes BCF needs.
struct Xml {
    writer: Writer<Vec<u8>>,
}

impl Xml {
    fn new() -> Result<Self, BcfError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
        Ok(Self { writer })
    }

    fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), BcfError> {
        let mut start = BytesStart::new(name);
        for attribute in attributes {
            start.push_attribute(*attribute);
        }
        self.writer
            .write_event(Event::Start(start))
            .map_err(xml_error)
    }

    fn close(&mut self, name: &str) -> Result<(), BcfError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), BcfError> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.writer
            .write_event(Event::Empty(element))
            .map_err(xml_error)
    }

    fn text(&mut self, name: &str, text: &str) -> Result<(), BcfError> {
        self.open(name, &[])?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
        self.close(name)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

#[must_use]
pub fn version_xml() -> Vec<u8> {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Version VersionId=\"{BCF_VERSION}\"/>\n"
    )
    .into_bytes()
}

pub fn project_xml(project: &BcfProject) -> Result<Vec<u8>, BcfError> {
    let mut xml = Xml::new()?;
    xml.open("ProjectInfo", &[])?;
    let project_id = project.project_id.to_string();
    xml.open("Project", &[("ProjectId", project_id.as_str())])?;
    xml.text("Name", &project.name)?;
    xml.close("Project")?;
    xml.close("ProjectInfo")?;
    Ok(xml.finish())
}

/// Topic types, statuses and users appearing in the project.
pub fn extensions_xml(project: &BcfProject) -> Result<Vec<u8>, BcfError> {
    let mut xml = Xml::new()?;
    xml.open("Extensions", &[])?;

    xml.open("TopicTypes", &[])?;
    for topic_type in project.topic_types() {
        xml.text("TopicType", topic_type)?;
    }
    xml.close("TopicTypes")?;

    xml.open("TopicStatuses", &[])?;
    xml.text("TopicStatus", super::topic::STATUS_OPEN)?;
    xml.close("TopicStatuses")?;

    xml.open("Users", &[])?;
    for author in project.authors() {
        xml.text("User", author)?;
    }
    xml.close("Users")?;

    xml.close("Extensions")?;
    Ok(xml.finish())
}

fn write_comment(xml: &mut Xml, comment: &Comment) -> Result<(), BcfError> {
    let guid = comment.guid.to_string();
    xml.open("Comment", &[("Guid", guid.as_str())])?;
    xml.text("Date", &timestamp(&comment.date))?;
    xml.text("Author", &comment.author)?;
    xml.text("Comment", &comment.text)?;
    if let Some(viewpoint) = comment.viewpoint {
        let viewpoint = viewpoint.to_string();
        xml.empty("Viewpoint", &[("Guid", viewpoint.as_str())])?;
    }
    xml.close("Comment")
}

pub fn markup_xml(project: &BcfProject, topic: &Topic) -> Result<Vec<u8>, BcfError> {
    let mut xml = Xml::new()?;
    xml.open("Markup", &[])?;

    if let Some(file) = &project.file {
        xml.open("Header", &[])?;
        xml.open("Files", &[])?;
        let mut attributes = vec![("IsExternal", "true")];
        if let Some(ifc_project) = &file.ifc_project {
            attributes.push(("IfcProject", ifc_project.as_str()));
        }
        xml.open("File", &attributes)?;
        xml.text("Filename", &file.filename)?;
        xml.text("Date", &timestamp(&topic.creation_date))?;
        xml.close("File")?;
        xml.close("Files")?;
        xml.close("Header")?;
    }

    let guid = topic.guid.to_string();
    xml.open(
        "Topic",
        &[
            ("Guid", guid.as_str()),
            ("TopicType", topic.topic_type.as_str()),
            ("TopicStatus", topic.status.as_str()),
        ],
    )?;
    xml.text("Title", &topic.title)?;
    xml.text("CreationDate", &timestamp(&topic.creation_date))?;
    xml.text("CreationAuthor", &topic.author)?;
    xml.text("Description", &topic.description)?;

    if !topic.comments.is_empty() {
        xml.open("Comments", &[])?;
        for comment in &topic.comments {
            write_comment(&mut xml, comment)?;
        }
        xml.close("Comments")?;
    }

    if let Some(viewpoint) = &topic.viewpoint {
        let vp_guid = viewpoint.guid.to_string();
        xml.open("Viewpoints", &[])?;
        xml.open("ViewPoint", &[("Guid", vp_guid.as_str())])?;
        xml.text("Viewpoint", VIEWPOINT_FILE)?;
        xml.close("ViewPoint")?;
        xml.close("Viewpoints")?;
    }

    xml.close("Topic")?;
    xml.close("Markup")?;
    Ok(xml.finish())
}

fn write_xyz(xml: &mut Xml, name: &str, x: f64, y: f64, z: f64) -> Result<(), BcfError> {
    xml.open(name, &[])?;
    xml.text("X", &x.to_string())?;
    xml.text("Y", &y.to_string())?;
    xml.text("Z", &z.to_string())?;
    xml.close(name)
}

fn write_point(xml: &mut Xml, name: &str, p: &Point3<f64>) -> Result<(), BcfError> {
    write_xyz(xml, name, p.x, p.y, p.z)
}

fn write_vector(xml: &mut Xml, name: &str, v: &Vector3<f64>) -> Result<(), BcfError> {
    write_xyz(xml, name, v.x, v.y, v.z)
}

fn write_camera(xml: &mut Xml, camera: &PerspectiveCamera) -> Result<(), BcfError> {
    xml.open("PerspectiveCamera", &[])?;
    write_point(xml, "CameraViewPoint", &camera.position)?;
    write_vector(xml, "CameraDirection", &camera.direction)?;
    write_vector(xml, "CameraUpVector", &camera.up)?;
    xml.text("FieldOfView", &camera.field_of_view.to_string())?;
    xml.text("AspectRatio", &camera.aspect_ratio.to_string())?;
    xml.close("PerspectiveCamera")
}

pub fn viewpoint_xml(viewpoint: &Viewpoint) -> Result<Vec<u8>, BcfError> {
    let mut xml = Xml::new()?;
    let guid = viewpoint.guid.to_string();
    xml.open("VisualizationInfo", &[("Guid", guid.as_str())])?;

    xml.open("Components", &[])?;
    if !viewpoint.components.is_empty() {
        xml.open("Selection", &[])?;
        for component in &viewpoint.components {
            xml.empty("Component", &[("IfcGuid", component.as_str())])?;
        }
        xml.close("Selection")?;
    }
    xml.empty("Visibility", &[("DefaultVisibility", "true")])?;
    xml.close("Components")?;

    if let Some(camera) = &viewpoint.camera {
        write_camera(&mut xml, camera)?;
    }

    xml.close("VisualizationInfo")?;
    Ok(xml.finish())
}

/// Streams the whole archive into `sink`.
pub fn write_bcf<W: Write + Seek>(project: &BcfProject, sink: W) -> Result<W, BcfError> {
    let mut zip = ZipWriter::new(sink);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("bcf.version", options)?;
    zip.write_all(&version_xml())?;

    zip.start_file("project.bcfp", options)?;
    zip.write_all(&project_xml(project)?)?;

    zip.start_file("extensions.xml", options)?;
    zip.write_all(&extensions_xml(project)?)?;

    for topic in &project.topics {
        zip.start_file(format!("{}/markup.bcf", topic.guid), options)?;
        zip.write_all(&markup_xml(project, topic)?)?;

        if let Some(viewpoint) = &topic.viewpoint {
            zip.start_file(format!("{}/{VIEWPOINT_FILE}", topic.guid), options)?;
            zip.write_all(&viewpoint_xml(viewpoint)?)?;
        }
    }

    Ok(zip.finish()?)
}

/// Writes `project` to a `.bcfzip` file, replacing any existing file.
///
/// # Example
///
/// ```no_run
/// use ifc_audit::bcf::{write_bcfzip, BcfProject};
///
/// let project = BcfProject::new("Demo".to_string());
/// write_bcfzip(&project, "structural_issues.bcfzip")?;
/// # Ok::<(), ifc_audit::error::BcfError>(())
/// ```
pub fn write_bcfzip<P: AsRef<Path>>(project: &BcfProject, path: P) -> Result<(), BcfError> {
    let file = File::create(&path).map_err(|source| BcfError::FileCreate {
        path: path.as_ref().to_path_buf(),
        source,
    })?;

    let mut file = write_bcf(project, file)?;
    file.flush()?;

    log::info!(
        path = path.as_ref().display().to_string(),
        topics = project.topics.len();
        "Wrote BCF archive"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcf::topic::ModelFile;
    use std::io::{Cursor, Read};
    use uuid::Uuid;

    fn as_text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    fn project() -> BcfProject {
        let mut project = BcfProject::new("Tower & Annex".to_string());
        project.file = Some(ModelFile {
            filename: "25-08-D-STR.ifc".to_string(),
            ifc_project: Some("0YvctVUKr0kugbFTf53O9L".to_string()),
        });
        let viewpoint = Viewpoint {
            guid: Uuid::new_v4(),
            components: vec!["1BeamGuid0000000000000".to_string()],
            camera: Some(PerspectiveCamera {
                position: Point3::new(1.0, 2.0, 3.0),
                direction: Vector3::new(0.0, 0.0, -1.0),
                up: Vector3::z(),
                field_of_view: 60.0,
                aspect_ratio: 1.0,
            }),
        };
        project.topics.push(Topic::new(
            "Slab-like Beam: IfcBeam (1BeamGuid0000000000000)".to_string(),
            "Beam <B1> is thin".to_string(),
            "Structural-Checker",
            "Structural Check",
            Some(viewpoint),
        ));
        project.topics.push(Topic::new(
            "Summary: Structural check results".to_string(),
            "All good".to_string(),
            "Structural-Checker",
            "Summary",
            None,
        ));
        project
    }

    #[test]
    fn markup_escapes_text_and_links_viewpoint() {
        let project = project();
        let topic = &project.topics[0];
        let markup = as_text(markup_xml(&project, topic).unwrap());

        assert!(markup.contains("<Description>Beam &lt;B1&gt; is thin</Description>"));
        assert!(markup.contains("TopicType=\"Structural Check\""));
        assert!(markup.contains("TopicStatus=\"Open\""));
        assert!(markup.contains("<Filename>25-08-D-STR.ifc</Filename>"));
        let vp_guid = topic.viewpoint.as_ref().unwrap().guid.to_string();
        assert!(markup.contains(&format!("<Viewpoint Guid=\"{vp_guid}\"/>")));
        assert!(markup.contains("<Viewpoint>viewpoint.bcfv</Viewpoint>"));
    }

    #[test]
    fn viewpoint_lists_components_and_camera() {
        let project = project();
        let viewpoint = project.topics[0].viewpoint.as_ref().unwrap();
        let xml = as_text(viewpoint_xml(viewpoint).unwrap());

        assert!(xml.contains("<Component IfcGuid=\"1BeamGuid0000000000000\"/>"));
        assert!(xml.contains("<Visibility DefaultVisibility=\"true\"/>"));
        assert!(xml.contains("<FieldOfView>60</FieldOfView>"));
        assert!(xml.contains("<CameraUpVector>"));
    }

    #[test]
    fn extensions_collect_topic_types() {
        let xml = as_text(extensions_xml(&project()).unwrap());
        assert!(xml.contains("<TopicType>Structural Check</TopicType>"));
        assert!(xml.contains("<TopicType>Summary</TopicType>"));
        assert!(xml.contains("<User>Structural-Checker</User>"));
    }

    #[test]
    fn project_name_is_escaped() {
        let xml = as_text(project_xml(&project()).unwrap());
        assert!(xml.contains("<Name>Tower &amp; Annex</Name>"));
    }

    #[test]
    fn archive_contains_every_part() {
        let project = project();
        let cursor = write_bcf(&project, Cursor::new(Vec::new())).unwrap();
        let mut archive = zip::ZipArchive::new(cursor).unwrap();

        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        let first = project.topics[0].guid;
        let second = project.topics[1].guid;
        let mut expected = vec![
            "bcf.version".to_string(),
            "extensions.xml".to_string(),
            "project.bcfp".to_string(),
            format!("{first}/markup.bcf"),
            format!("{first}/viewpoint.bcfv"),
            format!("{second}/markup.bcf"),
        ];
        expected.sort();
        pretty_assertions::assert_eq!(names, expected);

        let mut version = String::new();
        archive
            .by_name("bcf.version")
            .unwrap()
            .read_to_string(&mut version)
            .unwrap();
        assert!(version.contains("VersionId=\"3.0\""));
    }
}
