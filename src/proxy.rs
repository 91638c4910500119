//! Reverse-proxy configuration.
//!
//! Nginx on the remote host listens on port 80 and forwards every request
//! to the application on `localhost:<port>`. The site file is rendered from
//! one static template, written to a fixed path with `sudo tee`, enabled,
//! syntax-checked and then loaded with a reload.

use crate::defaults;
use crate::error::Result;
use crate::remote::RemoteSession;

/// Render the Nginx site forwarding port 80 to `localhost:<port>`.
pub fn render_site(port: u16) -> String {
    format!(
        r#"server {{
    listen 80;
    listen [::]:80;
    server_name _;

    location / {{
        proxy_pass http://localhost:{port};
        proxy_http_version 1.1;
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
        proxy_set_header Upgrade $http_upgrade;
        proxy_set_header Connection "upgrade";
    }}
}}
"#
    )
}

/// Commands run after the site file is written, in order.
pub fn activation_commands() -> Vec<String> {
    vec![
        format!(
            "sudo ln -sf {} {}",
            defaults::NGINX_SITE_PATH,
            defaults::NGINX_SITE_LINK
        ),
        format!("sudo rm -f {}", defaults::NGINX_DEFAULT_SITE_LINK),
        "sudo nginx -t".to_string(),
        "sudo systemctl reload nginx".to_string(),
    ]
}

/// Commands removing the site again. They never fail.
pub fn removal_commands() -> Vec<String> {
    vec![
        format!(
            "sudo rm -f {} {}",
            defaults::NGINX_SITE_LINK,
            defaults::NGINX_SITE_PATH
        ),
        "sudo systemctl reload nginx || true".to_string(),
    ]
}

/// Write the site for `port`, enable it and reload Nginx.
pub fn configure(session: &RemoteSession<'_>, port: u16) -> Result<()> {
    let site = render_site(port);
    session.exec_with_stdin(
        &format!("sudo tee {} > /dev/null", defaults::NGINX_SITE_PATH),
        &site,
    )?;
    for command in activation_commands() {
        session.exec(&command)?;
    }
    Ok(())
}
