//! Curated skill vocabulary, alias table, and the word lists used by the phrase pass.
//!
//! Entries are lower-case canonical forms. Words that collide with ordinary
//! English (`c`, `r`, `go`, `excel`, `express`, `vault`) only match through an
//! unambiguous alias such as `golang` or `microsoft excel`.

pub const SKILLS: &[&str] = &[
    // languages
    "python", "java", "javascript", "typescript", "c++", "c#", "ruby", "php", "swift",
    "kotlin", "rust", "scala", "matlab", "perl", "haskell", "elixir", "erlang", "clojure",
    "f#", "dart", "lua", "julia", "objective-c", "bash", "shell scripting", "powershell",
    "groovy", "fortran", "cobol", "solidity", "sql", "pl/sql", "t-sql", "html", "css",
    "sass", "webassembly",
    // web frameworks & frontend
    "react", "react native", "angular", "vue", "svelte", "next.js", "nuxt.js", "node.js",
    "django", "flask", "fastapi", "spring", "spring boot", "asp.net", ".net",
    "rails", "laravel", "symfony", "jquery", "redux", "tailwind", "bootstrap", "webpack",
    "vite", "graphql", "rest api", "grpc", "websockets", "oauth", "jwt", "openapi",
    "actix", "axum", "tokio", "ember.js", "backbone.js",
    "storybook", "three.js", "d3.js", "electron", "flutter", "xamarin", "ionic",
    "swiftui", "jetpack compose", "android", "ios",
    // data stores
    "mysql", "postgresql", "sqlite", "mongodb", "redis", "elasticsearch", "opensearch",
    "dynamodb", "cassandra", "oracle", "sql server", "mariadb", "couchdb", "neo4j",
    "snowflake", "bigquery", "redshift", "clickhouse", "influxdb", "timescaledb",
    "cockroachdb", "firebase", "supabase", "memcached", "qdrant", "pinecone", "weaviate",
    "milvus", "faiss", "pgvector",
    // cloud & devops
    "aws", "azure", "gcp", "docker", "kubernetes", "helm", "terraform", "ansible",
    "puppet", "pulumi", "jenkins", "gitlab ci", "github actions", "circleci",
    "travis ci", "argo cd", "ci/cd", "openshift", "nomad", "istio",
    "linkerd", "envoy", "nginx", "apache", "prometheus", "grafana", "datadog", "splunk",
    "new relic", "sentry", "elk stack", "cloudformation", "lambda", "ec2", "s3", "ecs",
    "eks", "fargate", "cloudflare", "heroku", "vercel", "netlify", "serverless", "linux",
    "unix", "windows server", "devops", "sre", "gitops",
    // messaging & data engineering
    "kafka", "rabbitmq", "activemq", "nats", "sqs", "sns", "pubsub", "celery", "airflow",
    "dagster", "prefect", "dbt", "spark", "pyspark", "hadoop", "hive", "flink",
    "databricks", "etl", "data pipelines", "data warehousing", "data modeling",
    // data science & ml
    "machine learning", "deep learning", "data science", "data analysis", "statistics",
    "tensorflow", "pytorch", "keras", "jax", "scikit-learn", "pandas", "numpy", "scipy",
    "matplotlib", "seaborn", "plotly", "jupyter", "xgboost", "lightgbm", "hugging face",
    "transformers", "llm", "nlp", "computer vision", "opencv", "spacy", "nltk",
    "reinforcement learning", "recommendation systems", "mlops", "mlflow", "kubeflow",
    "langchain", "llamaindex", "rag", "prompt engineering", "generative ai",
    "time series", "a/b testing", "tableau", "power bi", "looker",
    // practices & tools
    "git", "github", "gitlab", "bitbucket", "jira", "confluence", "agile", "scrum",
    "kanban", "tdd", "bdd", "microservices", "distributed systems", "system design",
    "event-driven architecture", "domain-driven design", "object-oriented programming",
    "functional programming", "concurrency", "multithreading", "unit testing",
    "integration testing", "selenium", "cypress", "playwright", "jest", "pytest",
    "junit", "mocha", "postman", "swagger", "figma", "accessibility",
    "seo", "web performance", "security", "penetration testing", "cryptography",
    "networking", "tcp/ip", "embedded systems", "rtos", "fpga", "verilog", "blockchain",
    "ethereum",
];

/// Surface form -> canonical vocabulary entry.
pub const ALIASES: &[(&str, &str)] = &[
    ("golang", "go"),
    ("k8s", "kubernetes"),
    ("postgres", "postgresql"),
    ("psql", "postgresql"),
    ("nodejs", "node.js"),
    ("reactjs", "react"),
    ("react.js", "react"),
    ("vuejs", "vue"),
    ("vue.js", "vue"),
    ("angularjs", "angular"),
    ("nextjs", "next.js"),
    ("expressjs", "express"),
    ("express.js", "express"),
    ("js", "javascript"),
    ("ts", "typescript"),
    ("py", "python"),
    ("python3", "python"),
    ("cpp", "c++"),
    ("csharp", "c#"),
    ("dotnet", ".net"),
    ("ruby on rails", "rails"),
    ("ror", "rails"),
    ("mongo", "mongodb"),
    ("elastic search", "elasticsearch"),
    ("mssql", "sql server"),
    ("amazon web services", "aws"),
    ("google cloud", "gcp"),
    ("google cloud platform", "gcp"),
    ("microsoft azure", "azure"),
    ("sklearn", "scikit-learn"),
    ("scikit learn", "scikit-learn"),
    ("tf", "tensorflow"),
    ("ml", "machine learning"),
    ("dl", "deep learning"),
    ("natural language processing", "nlp"),
    ("large language models", "llm"),
    ("llms", "llm"),
    ("genai", "generative ai"),
    ("huggingface", "hugging face"),
    ("restful", "rest api"),
    ("restful api", "rest api"),
    ("restful apis", "rest api"),
    ("rest apis", "rest api"),
    ("ci-cd", "ci/cd"),
    ("cicd", "ci/cd"),
    ("continuous integration", "ci/cd"),
    ("github action", "github actions"),
    ("rabbit mq", "rabbitmq"),
    ("apache kafka", "kafka"),
    ("apache spark", "spark"),
    ("apache airflow", "airflow"),
    ("micro-services", "microservices"),
    ("micro services", "microservices"),
    ("oop", "object-oriented programming"),
    ("ddd", "domain-driven design"),
    ("site reliability engineering", "sre"),
    ("powerbi", "power bi"),
    ("gke", "kubernetes"),
    ("aks", "kubernetes"),
    ("amazon s3", "s3"),
    ("aws lambda", "lambda"),
    ("wasm", "webassembly"),
    ("tailwindcss", "tailwind"),
    ("tailwind css", "tailwind"),
    ("microsoft excel", "excel"),
    ("hashicorp vault", "vault"),
    ("hashicorp consul", "consul"),
    ("apache beam", "beam"),
];

/// Head nouns that close a skill-bearing noun chunk ("distributed *systems*").
pub const HEAD_NOUNS: &[&str] = &[
    "learning", "systems", "vision", "processing", "engineering", "analysis",
    "analytics", "design", "development", "modeling", "modelling", "architecture",
    "computing", "testing", "security", "science", "infrastructure", "automation",
    "optimization", "mining", "warehousing", "visualization", "pipelines", "networking",
];

/// Modifiers that never form a skill chunk on their own.
pub const STOP_MODIFIERS: &[&str] = &[
    "a", "an", "the", "and", "or", "of", "in", "on", "for", "to", "with", "our", "your",
    "their", "its", "this", "that", "these", "those", "we", "you", "is", "are", "be",
    "strong", "good", "great", "excellent", "solid", "deep", "proven", "new", "large",
    "complex", "modern", "scalable", "robust", "various", "multiple", "critical", "core",
    "key", "internal", "existing", "current", "senior", "junior", "lead", "building",
    "build", "using", "use", "own", "drive", "support", "including", "related", "relevant",
    "hands", "years", "year", "team", "cross", "end", "high", "quality", "overall",
    "general", "basic", "advanced", "professional", "technical", "some", "any", "all",
    "other", "such", "as", "at", "by", "from", "into", "about", "than", "more", "most",
    "best", "better", "highly", "very", "well", "product", "business", "continuous",
];

/// Upper-case tokens that look like acronyms but are not skills.
pub const ACRONYM_STOPLIST: &[&str] = &[
    "i", "a", "ii", "iii", "iv", "us", "usa", "uk", "eu", "ceo", "cto", "cfo", "coo",
    "vp", "hr", "ms", "bs", "ba", "ma", "mba", "phd", "or", "and", "the", "to", "in",
    "of", "for", "nyc", "sf", "la", "ca", "ny", "tx", "wa", "il", "eoe", "ok", "pm",
    "am", "eta", "faq", "asap", "id", "tbd", "na", "q1", "q2", "q3", "q4", "gpa", "usd",
    "eur", "pto", "401k", "yoe", "fte", "b2b", "b2c", "it", "sr", "jr", "we", "you",
    "be", "is", "on", "at", "as", "an", "no", "new", "job", "apply", "kpi", "kpis",
    "okr", "okrs", "roi", "saas", "remote", "hq", "inc", "llc", "ltd", "dei", "cv",
];

/// Everyday words (up to six letters) that show up in shouted headings such
/// as "WHAT YOU GET" and must not pass as acronyms.
pub const COMMON_WORDS: &[&str] = &[
    "about", "above", "after", "again", "all", "also", "any", "are", "ask", "away", "back",
    "been", "being", "both", "but", "can", "could", "day", "days", "did", "do", "does",
    "done", "each", "email", "equity", "etc", "every", "extra", "few", "find", "from",
    "full", "get", "gets", "give", "goal", "goals", "good", "got", "great", "grow", "had",
    "has", "have", "he", "help", "her", "here", "him", "his", "how", "hybrid", "ideal",
    "if", "impact", "intern", "into", "its", "join", "just", "key", "lead", "learn", "less",
    "level", "life", "like", "looks", "love", "make", "many", "may", "me", "might", "more",
    "most", "much", "must", "my", "need", "needs", "nice", "not", "note", "now", "offer",
    "offers", "office", "one", "only", "onsite", "open", "other", "our", "ours", "out",
    "over", "own", "paid", "part", "pay", "per", "perks", "please", "plus", "points",
    "role", "roles", "salary", "same", "send", "she", "ship", "should", "skill", "skills",
    "so", "some", "stack", "such", "team", "teams", "tech", "than", "that", "their",
    "them", "there", "these", "they", "this", "those", "three", "time", "title", "today",
    "too", "tools", "top", "two", "under", "up", "very", "vision", "want", "wanted",
    "was", "way", "week", "well", "were", "what", "when", "where", "which", "who", "why",
    "will", "with", "work", "works", "would", "year", "years", "yes", "your", "yours",
];
