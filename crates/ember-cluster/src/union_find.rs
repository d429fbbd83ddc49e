//! Disjoint-set forest with path compression and union by rank.

/// Union-find over dense indices `0..len`.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    /// A forest of `len` singleton sets.
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of `x`'s set, compressing the path walked.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Merge the sets containing `a` and `b`. Returns the new root.
    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return ra;
        }
        let (parent, child) = if self.rank[ra] >= self.rank[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[child] = parent;
        if self.rank[ra] == self.rank[rb] {
            self.rank[parent] += 1;
        }
        parent
    }

    pub fn same_set(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn singletons_are_their_own_roots() {
        let mut uf = UnionFind::new(4);
        for i in 0..4 {
            assert_eq!(uf.find(i), i);
        }
    }

    #[test]
    fn union_links_two() {
        let mut uf = UnionFind::new(4);
        uf.union(0, 1);
        assert!(uf.same_set(0, 1));
        assert!(!uf.same_set(0, 2));
    }

    #[test]
    fn union_is_transitive() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(1, 2);
        uf.union(3, 4);
        assert!(uf.same_set(0, 2));
        assert!(uf.same_set(3, 4));
        assert!(!uf.same_set(2, 3));
    }

    #[test]
    fn deep_chain_links_fully() {
        // The depth case a fixed two-pass closure would miss.
        let n = 64;
        let mut uf = UnionFind::new(n);
        for i in 0..n - 1 {
            uf.union(i, i + 1);
        }
        for i in 0..n {
            assert!(uf.same_set(0, i));
        }
    }

    #[test]
    fn union_idempotent() {
        let mut uf = UnionFind::new(3);
        let r1 = uf.union(0, 1);
        let r2 = uf.union(0, 1);
        assert_eq!(r1, r2);
        assert!(uf.same_set(0, 1));
    }

    proptest! {
        #[test]
        fn closure_matches_naive(
            edges in prop::collection::vec((0usize..20, 0usize..20), 0..40)
        ) {
            let mut uf = UnionFind::new(20);
            for &(a, b) in &edges {
                uf.union(a, b);
            }

            // Naive reachability over the same edges.
            let mut adj = vec![vec![]; 20];
            for &(a, b) in &edges {
                adj[a].push(b);
                adj[b].push(a);
            }
            let reachable = |from: usize, to: usize| {
                let mut seen = vec![false; 20];
                let mut stack = vec![from];
                while let Some(x) = stack.pop() {
                    if x == to {
                        return true;
                    }
                    if seen[x] {
                        continue;
                    }
                    seen[x] = true;
                    stack.extend(adj[x].iter().copied());
                }
                false
            };

            for a in 0..20 {
                for b in 0..20 {
                    prop_assert_eq!(uf.same_set(a, b), reachable(a, b));
                }
            }
        }
    }
}
