//! Page meta descriptors for steps, checkout and finished pages

use serde::{Deserialize, Serialize};

use super::config::FormConfig;

/// A single page meta entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaDescriptor {
    Title { title: String },
    Name { name: String, content: String },
    Property { property: String, content: String },
    Charset { charset: String },
}

impl MetaDescriptor {
    pub fn title(title: impl Into<String>) -> Self {
        MetaDescriptor::Title {
            title: title.into(),
        }
    }

    pub fn name(name: impl Into<String>, content: impl Into<String>) -> Self {
        MetaDescriptor::Name {
            name: name.into(),
            content: content.into(),
        }
    }
}

fn with_no_follow(meta: &[MetaDescriptor]) -> Vec<MetaDescriptor> {
    let mut meta = meta.to_vec();
    meta.push(MetaDescriptor::name("robots", "noindex, nofollow"));
    meta.push(MetaDescriptor::name("googlebot", "noindex, nofollow"));
    meta
}

fn or_form_meta<'a>(config: &'a FormConfig, meta: Option<&'a [MetaDescriptor]>) -> &'a [MetaDescriptor] {
    match meta {
        Some(meta) if !meta.is_empty() => meta,
        _ => &config.meta,
    }
}

impl FormConfig {
    /// Meta for a step page, falling back to the form meta
    pub fn step_meta(&self, step_slug: &str) -> Vec<MetaDescriptor> {
        let step_meta = self.find_step(step_slug).map(|step| step.meta.as_slice());
        with_no_follow(or_form_meta(self, step_meta))
    }

    pub fn checkout_meta(&self) -> Vec<MetaDescriptor> {
        let checkout = self.checkout.as_ref().map(|page| page.meta.as_slice());
        with_no_follow(or_form_meta(self, checkout))
    }

    pub fn finished_meta(&self) -> Vec<MetaDescriptor> {
        let finished = self.finished.as_ref().map(|page| page.meta.as_slice());
        with_no_follow(or_form_meta(self, finished))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormId;
    use crate::form::config::tests::test_catalog;

    fn no_follow() -> Vec<MetaDescriptor> {
        vec![
            MetaDescriptor::name("robots", "noindex, nofollow"),
            MetaDescriptor::name("googlebot", "noindex, nofollow"),
        ]
    }

    #[test]
    fn test_step_meta_uses_step_entries() {
        let catalog = test_catalog();
        let config = catalog.get(&FormId::new("test")).unwrap();

        let mut expected = vec![MetaDescriptor::title("Step 1")];
        expected.extend(no_follow());
        assert_eq!(config.step_meta("step-1"), expected);
    }

    #[test]
    fn test_step_meta_falls_back_to_form_meta() {
        let catalog = test_catalog();
        let config = catalog.get(&FormId::new("test")).unwrap();

        let meta = config.step_meta("step-3");
        assert_eq!(meta[0], MetaDescriptor::title("Test"));
        assert_eq!(meta[1], MetaDescriptor::name("description", "Test description"));
        assert_eq!(&meta[2..], no_follow().as_slice());
    }

    #[test]
    fn test_checkout_and_finished_meta() {
        let catalog = test_catalog();
        let config = catalog.get(&FormId::new("test")).unwrap();

        assert_eq!(
            config.checkout_meta()[0],
            MetaDescriptor::title("Complete Your Test")
        );
        // no finished section configured
        assert_eq!(config.finished_meta()[0], MetaDescriptor::title("Test"));
        assert!(config.finished_meta().ends_with(&no_follow()));
    }

    #[test]
    fn test_meta_descriptor_shapes() {
        let meta: Vec<MetaDescriptor> = serde_json::from_str(
            r#"[{"title":"T"},{"name":"n","content":"c"},{"property":"og:title","content":"x"},{"charset":"utf-8"}]"#,
        )
        .unwrap();
        assert!(matches!(meta[0], MetaDescriptor::Title { .. }));
        assert!(matches!(meta[1], MetaDescriptor::Name { .. }));
        assert!(matches!(meta[2], MetaDescriptor::Property { .. }));
        assert!(matches!(meta[3], MetaDescriptor::Charset { .. }));
    }
}
