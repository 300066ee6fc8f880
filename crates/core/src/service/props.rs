//! Prop operations.

use crate::error::CoreError;
use crate::model::{Prop, StoryboardProject};

use super::recompile_all;

pub fn add_prop(
    project: &mut StoryboardProject,
    name: &str,
    material: &str,
    size_reference: &str,
    ref_image: &str,
) -> Result<Prop, CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("prop name must not be empty".to_string()));
    }
    let prop = Prop {
        material: material.to_string(),
        size_reference: size_reference.to_string(),
        ref_image: ref_image.to_string(),
        ..Prop::new(name.trim())
    };
    tracing::info!(project = %project.name, prop = %prop.name, id = %prop.id, "Prop added");
    project.props.push(prop.clone());
    project.touch();
    Ok(prop)
}

pub fn delete_prop(project: &mut StoryboardProject, id_or_name: &str) -> Result<Prop, CoreError> {
    let idx = project
        .props
        .iter()
        .position(|p| p.id == id_or_name)
        .or_else(|| project.props.iter().position(|p| p.name == id_or_name))
        .ok_or_else(|| CoreError::not_found("prop", id_or_name))?;
    let removed = project.props.remove(idx);
    recompile_all(project);
    Ok(removed)
}

pub fn list_props(project: &StoryboardProject) -> &[Prop] {
    &project.props
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{add_shot, update_shot, ShotUpdate};

    #[test]
    fn prop_appears_in_prompt_until_deleted() {
        let mut project = StoryboardProject::default();
        let cup = add_prop(&mut project, "Cup", "ceramic", "palm-sized", "").unwrap();
        add_shot(&mut project, "closeup", "", &[], "");
        update_shot(
            &mut project,
            1,
            ShotUpdate {
                props_in_shot: Some(vec![cup.id.clone()]),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(project.shots[0]
            .generated_prompt
            .contains("featuring focus on Cup (ceramic), palm-sized, detailed view"));

        delete_prop(&mut project, "Cup").unwrap();
        assert!(list_props(&project).is_empty());
        assert!(!project.shots[0].generated_prompt.contains("featuring"));
    }
}
