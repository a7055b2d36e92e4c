use pressline_common::{LinkType, StoryLink};

/// Ranks candidate links by: preferred link type (per the configured
/// `prefer_primary_link_order`), then source tier (lower wins), then
/// source ID alphabetically. The winner becomes a Story's `primary_link`.
pub fn select_primary(links: &[StoryLink], prefer_order: &[String]) -> StoryLink {
    links
        .iter()
        .min_by_key(|link| (link_type_rank(link.link_type, prefer_order), link.tier, link.source_id.clone()))
        .cloned()
        .expect("select_primary is only called with a non-empty link set")
}

fn link_type_rank(link_type: LinkType, prefer_order: &[String]) -> usize {
    prefer_order
        .iter()
        .position(|name| name == link_type.as_str())
        .unwrap_or(prefer_order.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(url: &str, link_type: LinkType, tier: u8, source_id: &str) -> StoryLink {
        StoryLink {
            url: url.to_string(),
            link_type,
            source_id: source_id.to_string(),
            tier,
            title: String::new(),
        }
    }

    #[test]
    fn prefers_link_type_order_first() {
        let order = vec!["official".to_string(), "github".to_string(), "blog".to_string()];
        let links = vec![
            link("https://blog.example.com/post", LinkType::Blog, 0, "blog-src"),
            link("https://github.com/acme/widget", LinkType::Github, 2, "github-src"),
        ];
        let primary = select_primary(&links, &order);
        assert_eq!(primary.link_type, LinkType::Github);
    }

    #[test]
    fn falls_back_to_tier_then_source_id() {
        let order: Vec<String> = Vec::new();
        let links = vec![
            link("https://a.example.com", LinkType::Blog, 1, "zzz-src"),
            link("https://b.example.com", LinkType::Blog, 0, "aaa-src"),
        ];
        let primary = select_primary(&links, &order);
        assert_eq!(primary.source_id, "aaa-src");
    }
}
