use super::domain::{PathwayTree, Reference};

/// Slash-delimited path pattern made of literal segments.
///
/// The leading segments address ancestor nodes by name. The final segment addresses
/// the reference itself, either by name or by its reference type tag, so both
/// `.../Indsatser/basketGrantReference` and `.../Indsatser/<intervention name>` work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<String>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn matches(&self, reference: &Reference) -> bool {
        let Some((leaf, ancestors)) = self.segments.split_last() else {
            return false;
        };

        ancestors.len() == reference.path.len()
            && ancestors
                .iter()
                .zip(&reference.path)
                .all(|(expected, actual)| expected == actual)
            && (leaf == &reference.name || leaf == reference.kind.tag())
    }
}

/// Return the references positioned at `pattern`, keeping their original order.
pub fn filter_by_path<'a>(
    references: &'a [Reference],
    pattern: &str,
    active_pathways_only: bool,
) -> Vec<&'a Reference> {
    let pattern = PathPattern::parse(pattern);
    references
        .iter()
        .filter(|reference| !active_pathways_only || reference.active_pathway)
        .filter(|reference| pattern.matches(reference))
        .collect()
}

impl PathwayTree {
    pub fn filter(&self, pattern: &str, active_pathways_only: bool) -> Vec<&Reference> {
        filter_by_path(&self.references, pattern, active_pathways_only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::discharge::domain::{EntityHandle, ReferenceKind};

    fn reference(handle: &str, path: &[&str], name: &str, kind: ReferenceKind) -> Reference {
        Reference {
            handle: EntityHandle::new(handle),
            path: path.iter().map(|segment| segment.to_string()).collect(),
            name: name.to_string(),
            kind,
            status: None,
            date: None,
            active_pathway: true,
        }
    }

    fn sample() -> Vec<Reference> {
        let grants = ["Sundhedsfagligt grundforløb", "FSIII", "Indsatser"];
        vec![
            reference("ref-1", &grants, "Genoptræning efter SUL § 140", ReferenceKind::Intervention),
            reference("ref-2", &["Sundhedsfagligt grundforløb", "FSIII"], "Slutnotat træning", ReferenceKind::Form),
            reference("ref-3", &grants, "Genoptræning udenbys borger (SUL § 140)", ReferenceKind::Intervention),
            reference("ref-4", &["Andet forløb", "FSIII", "Indsatser"], "Madservice", ReferenceKind::Intervention),
        ]
    }

    fn handles(references: &[&Reference]) -> Vec<String> {
        references
            .iter()
            .map(|reference| reference.handle.0.clone())
            .collect()
    }

    #[test]
    fn type_segment_matches_every_reference_of_that_kind_in_order() {
        let references = sample();
        let matched = filter_by_path(
            &references,
            "/Sundhedsfagligt grundforløb/FSIII/Indsatser/basketGrantReference",
            false,
        );
        assert_eq!(handles(&matched), vec!["ref-1", "ref-3"]);
    }

    #[test]
    fn name_segment_matches_single_reference() {
        let references = sample();
        let matched = filter_by_path(
            &references,
            "/Sundhedsfagligt grundforløb/FSIII/Indsatser/Genoptræning udenbys borger (SUL § 140)",
            true,
        );
        assert_eq!(handles(&matched), vec!["ref-3"]);
    }

    #[test]
    fn ancestor_mismatch_yields_empty_result() {
        let references = sample();
        assert!(filter_by_path(&references, "/Sundhedsfagligt grundforløb/Indsatser/basketGrantReference", false).is_empty());
        assert!(filter_by_path(&references, "/FSIII/Indsatser/basketGrantReference", false).is_empty());
        assert!(filter_by_path(&references, "", false).is_empty());
    }

    #[test]
    fn active_only_drops_references_on_closed_pathways() {
        let mut references = sample();
        references[0].active_pathway = false;

        let pattern = "/Sundhedsfagligt grundforløb/FSIII/Indsatser/basketGrantReference";
        assert_eq!(handles(&filter_by_path(&references, pattern, true)), vec!["ref-3"]);
        assert_eq!(
            handles(&filter_by_path(&references, pattern, false)),
            vec!["ref-1", "ref-3"]
        );
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let references = sample();
        let matched = filter_by_path(
            &references,
            "/Sundhedsfagligt grundforløb/FSIII/formDataV2Reference/",
            true,
        );
        assert_eq!(handles(&matched), vec!["ref-2"]);
    }
}
