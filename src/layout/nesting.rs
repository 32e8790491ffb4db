//! Level-ordered stack builder shared by list nesting and the heading
//! outline.

/// A node that can be arranged into a forest by nesting level.
pub(crate) trait Nested: Sized {
    fn nesting_level(&self) -> usize;
    fn push_child(&mut self, child: Self);
}

/// Arrange items (in document order) into a forest.
///
/// Each item becomes a child of the closest preceding item with a strictly
/// lower level, or a root when there is none. Children therefore always
/// have a greater level than their parent.
pub(crate) fn build_forest<T: Nested>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut roots: Vec<T> = Vec::new();
    let mut stack: Vec<T> = Vec::new();

    for item in items {
        let level = item.nesting_level();
        while stack
            .last()
            .map(|top| top.nesting_level() >= level)
            .unwrap_or(false)
        {
            if let Some(done) = stack.pop() {
                attach(done, &mut stack, &mut roots);
            }
        }
        stack.push(item);
    }
    while let Some(done) = stack.pop() {
        attach(done, &mut stack, &mut roots);
    }
    roots
}

fn attach<T: Nested>(node: T, stack: &mut [T], roots: &mut Vec<T>) {
    match stack.last_mut() {
        Some(parent) => parent.push_child(node),
        None => roots.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Node {
        name: &'static str,
        level: usize,
        children: Vec<Node>,
    }

    impl Nested for Node {
        fn nesting_level(&self) -> usize {
            self.level
        }

        fn push_child(&mut self, child: Self) {
            self.children.push(child);
        }
    }

    fn node(name: &'static str, level: usize) -> Node {
        Node {
            name,
            level,
            children: vec![],
        }
    }

    #[test]
    fn test_build_forest() {
        let forest = build_forest(vec![
            node("a", 0),
            node("a.1", 1),
            node("a.1.x", 2),
            node("a.2", 1),
            node("b", 0),
        ]);
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].name, "a");
        assert_eq!(forest[0].children.len(), 2);
        assert_eq!(forest[0].children[0].children[0].name, "a.1.x");
        assert_eq!(forest[1].name, "b");
    }

    #[test]
    fn test_deeper_first_item_becomes_root() {
        let forest = build_forest(vec![node("deep", 2), node("shallow", 0)]);
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].name, "deep");
    }
}
