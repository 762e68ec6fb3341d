/// 论坛敏感词屏蔽：不区分大小写匹配，命中的每个字符替换为 `*`。
#[derive(Debug, Clone, Default)]
pub struct ProfanityFilter {
    banned: Vec<Vec<char>>,
}

impl ProfanityFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let banned = words
            .into_iter()
            .map(|word| word.as_ref().trim().chars().map(fold).collect::<Vec<_>>())
            .filter(|word| !word.is_empty())
            .collect();
        Self { banned }
    }

    pub fn is_empty(&self) -> bool {
        self.banned.is_empty()
    }

    pub fn mask(&self, text: &str) -> String {
        if self.banned.is_empty() {
            return text.to_owned();
        }

        let chars: Vec<char> = text.chars().collect();
        let folded: Vec<char> = chars.iter().copied().map(fold).collect();
        let mut masked = vec![false; chars.len()];

        for start in 0..folded.len() {
            for word in &self.banned {
                let end = start + word.len();
                if end <= folded.len() && folded[start..end] == word[..] {
                    masked[start..end].iter_mut().for_each(|flag| *flag = true);
                }
            }
        }

        chars
            .into_iter()
            .zip(masked)
            .map(|(ch, hit)| if hit { '*' } else { ch })
            .collect()
    }
}

fn fold(ch: char) -> char {
    ch.to_lowercase().next().unwrap_or(ch)
}
