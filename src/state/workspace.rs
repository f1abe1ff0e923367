/// A directory or file in the workspace listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTreeNode {
    pub name: String,
    /// Slash-joined path from the workspace root.
    pub path: String,
    pub is_file: bool,
    pub children: Vec<FileTreeNode>,
}

/// Workspace paths folded into a tree, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    pub roots: Vec<FileTreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine<'a> {
    pub depth: usize,
    pub node: &'a FileTreeNode,
}

impl FileTree {
    /// Accepts both `/` and `\` separated paths; empty segments are skipped.
    pub fn build<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = FileTree::default();
        for path in paths {
            let parts: Vec<&str> = path
                .as_ref()
                .split(|c: char| c == '/' || c == '\\')
                .filter(|part| !part.is_empty())
                .collect();
            insert_path(&mut tree.roots, &parts, 0);
        }
        tree
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first listing, parents before their children.
    pub fn lines(&self) -> Vec<TreeLine<'_>> {
        let mut lines = Vec::new();
        collect_lines(&self.roots, 0, &mut lines);
        lines
    }
}

fn insert_path(nodes: &mut Vec<FileTreeNode>, parts: &[&str], depth: usize) {
    let Some((name, rest)) = parts[depth..].split_first() else {
        return;
    };

    let position = match nodes.iter().position(|node| node.name == *name) {
        Some(position) => position,
        None => {
            nodes.push(FileTreeNode {
                name: name.to_string(),
                path: parts[..=depth].join("/"),
                is_file: rest.is_empty(),
                children: Vec::new(),
            });
            nodes.len() - 1
        }
    };

    if !rest.is_empty() {
        insert_path(&mut nodes[position].children, parts, depth + 1);
    }
}

fn collect_lines<'a>(nodes: &'a [FileTreeNode], depth: usize, lines: &mut Vec<TreeLine<'a>>) {
    for node in nodes {
        lines.push(TreeLine { depth, node });
        if !node.is_file && !node.children.is_empty() {
            collect_lines(&node.children, depth + 1, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_merges_shared_directories() {
        let tree = FileTree::build(["web/index.html", "web\\css\\site.css", "README.md"]);
        assert_eq!(tree.roots.len(), 2);

        let web = &tree.roots[0];
        assert_eq!(web.name, "web");
        assert!(!web.is_file);
        assert_eq!(web.children.len(), 2);
        assert_eq!(web.children[1].children[0].path, "web/css/site.css");
        assert!(tree.roots[1].is_file);
    }

    #[test]
    fn test_lines_are_depth_first() {
        let tree = FileTree::build(["a/b/c.txt", "a/d.txt", "e.txt"]);
        let listing: Vec<(usize, &str)> = tree
            .lines()
            .iter()
            .map(|line| (line.depth, line.node.name.as_str()))
            .collect();
        assert_eq!(
            listing,
            vec![(0, "a"), (1, "b"), (2, "c.txt"), (1, "d.txt"), (0, "e.txt")]
        );
    }

    #[test]
    fn test_empty_listing() {
        let tree = FileTree::build(Vec::<String>::new());
        assert!(tree.is_empty());
        assert!(FileTree::build(["", "//"]).is_empty());
    }
}
